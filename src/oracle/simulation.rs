//! Fitness through an external simulation.
//!
//! The engine that actually runs agents lives outside this crate. It is
//! reached through [`Simulator`]: configure it from a [`RunPlan`], run it,
//! read named outputs back from the [`ExitLog`]. A [`ScoringFunction`]
//! turns an exit log into one number.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::{debug, trace};

use crate::chromosome::{Chromosome, ParameterSpec};
use crate::error::{Result, SearchError};
use crate::experiment::{Experiment, PropertySpec, RunPlan};
use crate::rng::RandomNumberGenerator;

use super::FitnessOracle;

/// The external simulation engine.
pub trait Simulator {
    /// Applies the plan's initial state, seed and step count.
    fn configure(&mut self, plan: &RunPlan) -> Result<()>;

    /// Runs the configured simulation to completion.
    fn run(&mut self) -> Result<ExitLog>;
}

/// Builds a fresh simulator for each evaluation.
pub type SimulatorFactory = Box<dyn Fn() -> Result<Box<dyn Simulator>> + Send + Sync>;

/// Environment values recorded at the end of a simulation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExitLog {
    scalars: BTreeMap<String, f64>,
    arrays: BTreeMap<String, Vec<f64>>,
}

impl ExitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set_scalar(name, value);
        self
    }

    pub fn with_array(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.set_array(name, values);
        self
    }

    pub fn set_scalar(&mut self, name: impl Into<String>, value: f64) {
        self.scalars.insert(name.into(), value);
    }

    pub fn set_array(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.arrays.insert(name.into(), values);
    }

    pub fn get_scalar(&self, name: &str) -> Result<f64> {
        self.scalars
            .get(name)
            .copied()
            .ok_or_else(|| SearchError::MalformedResult(format!("no scalar named '{}'", name)))
    }

    pub fn get_named_array(&self, name: &str) -> Result<&[f64]> {
        self.arrays
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SearchError::MalformedResult(format!("no array named '{}'", name)))
    }
}

/// Turns a simulation's exit log into a fitness value.
pub trait ScoringFunction: Send + Sync {
    fn score(&self, log: &ExitLog) -> Result<f64>;
}

impl<F> ScoringFunction for F
where
    F: Fn(&ExitLog) -> Result<f64> + Send + Sync,
{
    fn score(&self, log: &ExitLog) -> Result<f64> {
        self(log)
    }
}

/// One weighted element of a named exit-log array.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTerm {
    pub array: String,
    pub index: usize,
    pub weight: f64,
}

/// `constant + sum(weight * array[index])`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearScore {
    terms: Vec<ScoreTerm>,
    constant: f64,
}

impl LinearScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, array: impl Into<String>, index: usize, weight: f64) -> Self {
        self.terms.push(ScoreTerm {
            array: array.into(),
            index,
            weight,
        });
        self
    }

    pub fn constant(mut self, constant: f64) -> Self {
        self.constant = constant;
        self
    }

    pub fn terms(&self) -> &[ScoreTerm] {
        &self.terms
    }

    /// The predator-prey-grass score over the `fitnesses` array:
    /// `f[0] + 100 * f[1] - f[2] / 1000`.
    pub fn predator_prey() -> Self {
        Self::new()
            .term("fitnesses", 0, 1.0)
            .term("fitnesses", 1, 100.0)
            .term("fitnesses", 2, -1.0 / 1000.0)
    }
}

impl ScoringFunction for LinearScore {
    fn score(&self, log: &ExitLog) -> Result<f64> {
        let mut total = self.constant;
        for term in &self.terms {
            let values = log.get_named_array(&term.array)?;
            let value = values.get(term.index).ok_or_else(|| {
                SearchError::MalformedResult(format!(
                    "array '{}' has {} elements, index {} requested",
                    term.array,
                    values.len(),
                    term.index
                ))
            })?;
            total += term.weight * value;
        }
        Ok(total)
    }
}

/// Oracle that configures an [`Experiment`] from a chromosome and scores
/// the simulation runs it produces.
///
/// Each gene overrides the experiment global of the same name as its
/// parameter. Every run plan of the experiment is simulated and scored; the
/// fitness is the mean score. Without a simulator factory the oracle scores
/// every chromosome 0.0.
pub struct SimulationOracle<C = LinearScore>
where
    C: ScoringFunction,
{
    experiment: Experiment,
    parameter_names: Vec<String>,
    scoring: C,
    simulator: Option<SimulatorFactory>,
    seed: u64,
}

impl<C> SimulationOracle<C>
where
    C: ScoringFunction,
{
    pub fn new(experiment: Experiment, parameters: &[ParameterSpec], scoring: C) -> Self {
        Self {
            experiment,
            parameter_names: parameters.iter().map(|p| p.name.clone()).collect(),
            scoring,
            simulator: None,
            seed: 0,
        }
    }

    /// Binds the simulation engine.
    pub fn with_simulator<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Simulator>> + Send + Sync + 'static,
    {
        self.simulator = Some(Box::new(factory));
        self
    }

    /// Base seed for run-plan generation. Plans are seeded from this and the
    /// gene values, so any chromosome with the same genes replays the same
    /// runs whatever its lineage id.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.simulator.is_some()
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    /// The experiment with the chromosome's genes applied as globals.
    pub fn configure(&self, chromosome: &Chromosome) -> Result<Experiment> {
        if chromosome.len() != self.parameter_names.len() {
            return Err(SearchError::Oracle(format!(
                "chromosome {} has {} genes but {} parameters are mapped",
                chromosome.id(),
                chromosome.len(),
                self.parameter_names.len()
            )));
        }

        let mut experiment = self.experiment.clone();
        let generator = experiment.generator_mut();
        for (name, gene) in self.parameter_names.iter().zip(chromosome.genes()) {
            generator.set_global(name, PropertySpec::Constant((*gene).into()));
        }
        Ok(experiment)
    }

    fn plan_seed(&self, chromosome: &Chromosome) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        chromosome.gene_key().hash(&mut hasher);
        hasher.finish()
    }
}

impl<C> fmt::Debug for SimulationOracle<C>
where
    C: ScoringFunction,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationOracle")
            .field("experiment", &self.experiment.name())
            .field("parameter_names", &self.parameter_names)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl<C> FitnessOracle for SimulationOracle<C>
where
    C: ScoringFunction,
{
    fn evaluate(&self, chromosome: &Chromosome) -> Result<f64> {
        let Some(factory) = &self.simulator else {
            trace!(chromosome = chromosome.id(), "no simulator bound, placeholder fitness");
            return Ok(0.0);
        };

        let experiment = self.configure(chromosome)?;
        let mut rng = RandomNumberGenerator::from_seed(self.plan_seed(chromosome));
        let mut simulator = factory()?;
        let logs = experiment.begin(simulator.as_mut(), &mut rng)?;

        if logs.is_empty() {
            return Err(SearchError::Oracle(format!(
                "experiment '{}' produced no exit logs",
                experiment.name()
            )));
        }

        let mut total = 0.0;
        for log in &logs {
            total += self.scoring.score(log)?;
        }
        let fitness = total / logs.len() as f64;

        debug!(chromosome = chromosome.id(), runs = logs.len(), fitness, "simulation scored");
        Ok(fitness)
    }
}
