//! # Experiment
//!
//! A reproducible simulation experiment: how many runs to perform, how many
//! steps each run lasts and how the initial state of every run is generated.
//! An experiment does not simulate anything itself; it produces
//! [`RunPlan`]s and feeds them to a [`Simulator`].
//!
//! ## Example
//!
//! ```rust
//! use simsearch::experiment::{AgentPopulation, Experiment, InitialStateGenerator};
//! use simsearch::rng::RandomNumberGenerator;
//!
//! let mut generator = InitialStateGenerator::new();
//! generator
//!     .set_global_int("PREY_POPULATION_TO_GENERATE", 100, 400)
//!     .add_agent_population(AgentPopulation::new("Grass").with_pop_size(64));
//!
//! let experiment = Experiment::new("ppg")
//!     .with_runs(4)
//!     .with_steps(250)
//!     .with_generator(generator);
//!
//! let plans = experiment.plans(&mut RandomNumberGenerator::from_seed(3)).unwrap();
//! assert_eq!(plans.len(), 4);
//! assert!(plans.iter().all(|p| p.steps == 250));
//! ```

pub mod agents;
pub mod generator;

pub use agents::{AgentPopulation, AgentPopulationPlan, AgentVariable, PopulationSize};
pub use generator::{InitialState, InitialStateGenerator, PropertySpec, PropertyValue};

use tracing::debug;

use crate::error::{Result, SearchError};
use crate::oracle::simulation::{ExitLog, Simulator};
use crate::rng::RandomNumberGenerator;

/// One simulation instance to run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    /// Position of the plan within the experiment.
    pub index: usize,
    pub steps: u64,
    pub seed: u64,
    pub state: InitialState,
}

#[derive(Debug, Clone)]
pub struct Experiment {
    name: String,
    runs: usize,
    repeats: usize,
    steps: u64,
    generator: InitialStateGenerator,
}

impl Default for Experiment {
    fn default() -> Self {
        Self::new("experiment")
    }
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs: 1,
            repeats: 1,
            steps: 10,
            generator: InitialStateGenerator::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn generator(&self) -> &InitialStateGenerator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut InitialStateGenerator {
        &mut self.generator
    }

    /// Number of distinct initial states (each one an ensemble member).
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    /// Number of times each initial state is simulated with a different seed.
    pub fn with_repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_generator(mut self, generator: InitialStateGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 || self.repeats == 0 {
            return Err(SearchError::Configuration(format!(
                "Experiment '{}' needs at least one run and one repeat",
                self.name
            )));
        }
        self.generator.validate()
    }

    /// Builds `runs * repeats` plans.
    ///
    /// Seeds start at a random value and advance by a random step, so every
    /// plan of the ensemble gets a distinct simulation seed.
    pub fn plans(&self, rng: &mut RandomNumberGenerator) -> Result<Vec<RunPlan>> {
        self.validate()?;

        let total = self.runs.checked_mul(self.repeats).ok_or_else(|| {
            SearchError::Configuration(format!(
                "Experiment '{}' has too many plans: {} runs x {} repeats",
                self.name, self.runs, self.repeats
            ))
        })?;
        let first_seed = rng.next_seed();
        let max_step = ((i64::MAX as u64) / total as u64).max(1) as i64;
        let seed_step = rng.uniform_i64(1, max_step) as u64;

        let mut plans = Vec::with_capacity(total);
        for run in 0..self.runs {
            let state = self.generator.generate(rng)?;
            for repeat in 0..self.repeats {
                let index = run * self.repeats + repeat;
                plans.push(RunPlan {
                    index,
                    steps: self.steps,
                    seed: first_seed.wrapping_add(seed_step.wrapping_mul(index as u64)),
                    state: state.clone(),
                });
            }
        }
        Ok(plans)
    }

    /// Runs every plan on `simulator` and returns the exit logs in plan order.
    pub fn begin<S>(&self, simulator: &mut S, rng: &mut RandomNumberGenerator) -> Result<Vec<ExitLog>>
    where
        S: Simulator + ?Sized,
    {
        let plans = self.plans(rng)?;
        debug!(experiment = %self.name, plans = plans.len(), "beginning experiment");

        let mut logs = Vec::with_capacity(plans.len());
        for plan in &plans {
            simulator.configure(plan)?;
            logs.push(simulator.run()?);
        }

        debug!(experiment = %self.name, "completed experiment");
        Ok(logs)
    }
}
