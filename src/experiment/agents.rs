//! Agent population descriptions.

use crate::error::{Result, SearchError};
use crate::rng::RandomNumberGenerator;

use super::generator::{upsert, PropertySpec, PropertyValue};

pub const DEFAULT_AGENT_STATE: &str = "DEFAULT1";
pub const DEFAULT_POP_MIN: usize = 1;
pub const DEFAULT_POP_MAX: usize = 1024;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PopulationSize {
    /// One population whose size is drawn from `[min, max]`.
    Range { min: usize, max: usize },
    /// One population per listed size.
    List(Vec<usize>),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum AgentVariable {
    /// One value shared by every agent of the population.
    Shared(PropertySpec),
    /// A fresh uniform draw for each agent.
    PerAgent { min: f64, max: f64 },
}

/// A generated agent population, ready to hand to the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentPopulationPlan {
    pub agent: String,
    pub state: String,
    pub size: usize,
    pub shared: Vec<(String, PropertyValue)>,
    pub per_agent: Vec<(String, Vec<f64>)>,
}

/// How to generate a valid population of one agent type.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentPopulation {
    name: String,
    state: String,
    size: PopulationSize,
    variables: Vec<(String, AgentVariable)>,
}

impl AgentPopulation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: DEFAULT_AGENT_STATE.to_string(),
            size: PopulationSize::Range {
                min: DEFAULT_POP_MIN,
                max: DEFAULT_POP_MAX,
            },
            variables: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> &PopulationSize {
        &self.size
    }

    pub fn variables(&self) -> &[(String, AgentVariable)] {
        &self.variables
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Fixes the population size.
    pub fn with_pop_size(mut self, size: usize) -> Self {
        self.size = PopulationSize::Range {
            min: size,
            max: size,
        };
        self
    }

    pub fn with_pop_size_range(mut self, min: usize, max: usize) -> Self {
        self.size = PopulationSize::Range { min, max };
        self
    }

    pub fn with_pop_size_min(mut self, min: usize) -> Self {
        let max = match self.size {
            PopulationSize::Range { max, .. } => max,
            PopulationSize::List(_) => DEFAULT_POP_MAX,
        };
        self.size = PopulationSize::Range { min, max };
        self
    }

    pub fn with_pop_size_max(mut self, max: usize) -> Self {
        let min = match self.size {
            PopulationSize::Range { min, .. } => min,
            PopulationSize::List(_) => DEFAULT_POP_MIN,
        };
        self.size = PopulationSize::Range { min, max };
        self
    }

    pub fn with_pop_size_list(mut self, sizes: Vec<usize>) -> Self {
        self.size = PopulationSize::List(sizes);
        self
    }

    pub fn with_variable(mut self, name: &str, spec: PropertySpec) -> Self {
        upsert(&mut self.variables, name, AgentVariable::Shared(spec));
        self
    }

    pub fn with_variable_per_agent(mut self, name: &str, min: f64, max: f64) -> Self {
        upsert(
            &mut self.variables,
            name,
            AgentVariable::PerAgent { min, max },
        );
        self
    }

    pub fn validate(&self) -> Result<()> {
        match &self.size {
            PopulationSize::Range { min, max } if min > max => {
                return Err(SearchError::Configuration(format!(
                    "Agent '{}' has population range [{}, {}] with min > max",
                    self.name, min, max
                )));
            }
            PopulationSize::List(sizes) if sizes.is_empty() => {
                return Err(SearchError::Configuration(format!(
                    "Agent '{}' has an empty population size list",
                    self.name
                )));
            }
            _ => {}
        }

        for (name, variable) in &self.variables {
            match variable {
                AgentVariable::Shared(spec) => spec.validate(name)?,
                AgentVariable::PerAgent { min, max } => {
                    PropertySpec::FloatRange {
                        min: *min,
                        max: *max,
                    }
                    .validate(name)?;
                }
            }
        }
        Ok(())
    }

    pub fn generate(&self, rng: &mut RandomNumberGenerator) -> Result<Vec<AgentPopulationPlan>> {
        self.validate()?;

        let sizes = match &self.size {
            PopulationSize::Range { min, max } => {
                vec![rng.uniform_i64(*min as i64, *max as i64) as usize]
            }
            PopulationSize::List(sizes) => sizes.clone(),
        };

        Ok(sizes
            .into_iter()
            .map(|size| self.plan(size, rng))
            .collect())
    }

    fn plan(&self, size: usize, rng: &mut RandomNumberGenerator) -> AgentPopulationPlan {
        let mut shared = Vec::new();
        let mut per_agent = Vec::new();

        for (name, variable) in &self.variables {
            match variable {
                AgentVariable::Shared(spec) => shared.push((name.clone(), spec.sample(rng))),
                AgentVariable::PerAgent { min, max } => per_agent.push((
                    name.clone(),
                    (0..size).map(|_| rng.uniform_f64(*min, *max)).collect(),
                )),
            }
        }

        AgentPopulationPlan {
            agent: self.name.clone(),
            state: self.state.clone(),
            size,
            shared,
            per_agent,
        }
    }
}
