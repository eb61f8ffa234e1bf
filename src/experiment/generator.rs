//! Initial-state generation: global simulation properties and agent populations.

use std::path::{Path, PathBuf};

use crate::chromosome::ParameterValue;
use crate::error::{Result, SearchError};
use crate::rng::RandomNumberGenerator;

use super::agents::{AgentPopulation, AgentPopulationPlan};

/// A concrete value handed to the simulation for a named property.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    FloatList(Vec<f64>),
    Text(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(v) => Some(*v as f64),
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<ParameterValue> for PropertyValue {
    fn from(value: ParameterValue) -> Self {
        match value {
            ParameterValue::Int(v) => PropertyValue::Int(v),
            ParameterValue::Float(v) => PropertyValue::Float(v),
        }
    }
}

/// How a property gets its value each time a run plan is generated.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySpec {
    Constant(PropertyValue),
    IntRange { min: i64, max: i64 },
    FloatRange { min: f64, max: f64 },
    /// One of the listed values, picked uniformly.
    Choice(Vec<PropertyValue>),
}

impl PropertySpec {
    pub fn validate(&self, name: &str) -> Result<()> {
        match *self {
            PropertySpec::Choice(ref options) if options.is_empty() => {
                Err(SearchError::Configuration(format!(
                    "Property '{}' has no values to choose from",
                    name
                )))
            }
            PropertySpec::IntRange { min, max } if min > max => Err(SearchError::Configuration(
                format!("Property '{}' has range [{}, {}] with min > max", name, min, max),
            )),
            PropertySpec::FloatRange { min, max }
                if !(max - min).is_finite() || min > max =>
            {
                Err(SearchError::Configuration(format!(
                    "Property '{}' has invalid range [{}, {}]",
                    name, min, max
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn sample(&self, rng: &mut RandomNumberGenerator) -> PropertyValue {
        match self {
            PropertySpec::Constant(value) => value.clone(),
            PropertySpec::IntRange { min, max } => PropertyValue::Int(rng.uniform_i64(*min, *max)),
            PropertySpec::FloatRange { min, max } => {
                PropertyValue::Float(rng.uniform_f64(*min, *max))
            }
            PropertySpec::Choice(options) => match options.len() {
                0 => PropertyValue::Text(String::new()),
                n => options[rng.index(n)].clone(),
            },
        }
    }
}

/// Replaces the entry called `name`, or appends it. Order of first insertion is kept.
pub(crate) fn upsert<T>(entries: &mut Vec<(String, T)>, name: &str, value: T) {
    match entries.iter_mut().find(|(existing, _)| existing == name) {
        Some(entry) => entry.1 = value,
        None => entries.push((name.to_string(), value)),
    }
}

/// Everything a simulation needs to start one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InitialState {
    pub file: Option<PathBuf>,
    pub globals: Vec<(String, PropertyValue)>,
    pub populations: Vec<AgentPopulationPlan>,
}

impl InitialState {
    pub fn global(&self, name: &str) -> Option<&PropertyValue> {
        self.globals
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }
}

/// Describes how to build a valid initial state: optional state file,
/// global properties and agent populations.
#[derive(Debug, Clone, Default)]
pub struct InitialStateGenerator {
    file: Option<PathBuf>,
    globals: Vec<(String, PropertySpec)>,
    agents: Vec<AgentPopulation>,
}

impl InitialStateGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_state_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    pub fn set_global(&mut self, name: &str, spec: PropertySpec) -> &mut Self {
        upsert(&mut self.globals, name, spec);
        self
    }

    pub fn set_global_int(&mut self, name: &str, min: i64, max: i64) -> &mut Self {
        self.set_global(name, PropertySpec::IntRange { min, max })
    }

    pub fn set_global_float(&mut self, name: &str, min: f64, max: f64) -> &mut Self {
        self.set_global(name, PropertySpec::FloatRange { min, max })
    }

    pub fn set_global_value(&mut self, name: &str, value: PropertyValue) -> &mut Self {
        self.set_global(name, PropertySpec::Constant(value))
    }

    pub fn set_global_list(&mut self, name: &str, values: Vec<f64>) -> &mut Self {
        self.set_global_value(name, PropertyValue::FloatList(values))
    }

    pub fn set_global_text(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.set_global_value(name, PropertyValue::Text(value.into()))
    }

    pub fn add_agent_population(&mut self, agent: AgentPopulation) -> &mut Self {
        self.agents.push(agent);
        self
    }

    pub fn globals(&self) -> &[(String, PropertySpec)] {
        &self.globals
    }

    pub fn agents(&self) -> &[AgentPopulation] {
        &self.agents
    }

    pub fn validate(&self) -> Result<()> {
        for (name, spec) in &self.globals {
            spec.validate(name)?;
        }
        for agent in &self.agents {
            agent.validate()?;
        }
        Ok(())
    }

    /// Samples every global and every agent population once.
    pub fn generate(&self, rng: &mut RandomNumberGenerator) -> Result<InitialState> {
        self.validate()?;

        let globals = self
            .globals
            .iter()
            .map(|(name, spec)| (name.clone(), spec.sample(rng)))
            .collect();

        let mut populations = Vec::new();
        for agent in &self.agents {
            populations.extend(agent.generate(rng)?);
        }

        Ok(InitialState {
            file: self.file.clone(),
            globals,
            populations,
        })
    }
}
