//! # SearchConfig
//!
//! Every option a search recognises, with the defaults of a small
//! exploratory run. Build one with [`SearchConfig::builder`]; `build`
//! validates the result so a bad configuration is rejected before any
//! simulation is started.
//!
//! ```rust
//! use std::time::Duration;
//! use simsearch::chromosome::ParameterSpec;
//! use simsearch::search::SearchConfig;
//!
//! let config = SearchConfig::builder()
//!     .mu(8)
//!     .lambda(4)
//!     .max_generations(20)
//!     .max_time(Duration::from_secs(600))
//!     .parameter(ParameterSpec::int("PREY_POPULATION_TO_GENERATE", 0, 1000))
//!     .parameter(ParameterSpec::float("PREY_REPRODUCTION_CHANCE", 0.0, 0.25))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.parameter_limits.len(), 2);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::chromosome::{ChromosomeFactory, ParameterSpec};
use crate::error::{Result, SearchError};
use crate::stats::Statistic;
use crate::tracker::DedupPolicy;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Population size kept between generations.
    pub mu: usize,
    /// Offspring produced per generation.
    pub lambda: usize,
    pub max_generations: usize,
    /// Wall-clock budget, checked at the end of each generation.
    pub max_time: Duration,
    /// Per-gene mutation probability handed to the variator.
    pub mutation_rate: f64,
    /// Probability that an offspring is a fresh random chromosome instead
    /// of the child of two parents.
    pub random_initialisation_chance: f64,
    /// Fitness strictly above this is recorded as an optimal solution.
    pub optimal_fitness: f64,
    /// Objective weights; only the first is used. Positive maximises.
    pub fitness_weights: Vec<f64>,
    /// One entry per gene. The bound type decides the gene type.
    pub parameter_limits: Vec<ParameterSpec>,
    /// Summary file, relative to `output_dir`.
    pub output_file: String,
    pub logged_stats: Vec<Statistic>,
    pub output_dir: PathBuf,
    /// Seed for the search's random source; `None` draws one from entropy.
    pub seed: Option<u64>,
    pub evaluation_timeout: Option<Duration>,
    /// Size of a dedicated evaluation pool; `None` uses rayon's global pool.
    pub max_concurrent_evaluations: Option<usize>,
    /// Stop after the first generation that discovers an optimal solution.
    pub stop_on_optimal: bool,
    pub dedup: DedupPolicy,
    /// Report every evaluated fitness at `debug` instead of `trace`.
    pub verbose: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mu: 2,
            lambda: 1,
            max_generations: 5,
            max_time: Duration::from_secs(100),
            mutation_rate: 0.2,
            random_initialisation_chance: 0.05,
            optimal_fitness: 1.0,
            fitness_weights: vec![1.0],
            parameter_limits: vec![ParameterSpec::float("param_0", -1.0, 1.0)],
            output_file: "search_results.csv".to_string(),
            logged_stats: Statistic::ALL.to_vec(),
            output_dir: PathBuf::from("."),
            seed: None,
            evaluation_timeout: None,
            max_concurrent_evaluations: None,
            stop_on_optimal: false,
            dedup: DedupPolicy::Exact,
            verbose: false,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SearchError::Configuration(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::new()
    }

    /// The weight of the single objective.
    pub fn weight(&self) -> f64 {
        self.fitness_weights.first().copied().unwrap_or(1.0)
    }

    /// Checks every option.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Configuration` naming the first invalid option.
    pub fn validate(&self) -> Result<()> {
        if self.mu == 0 {
            return Err(SearchError::Configuration(
                "mu (population size) cannot be zero".to_string(),
            ));
        }
        if self.lambda == 0 {
            return Err(SearchError::Configuration(
                "lambda (number of offspring) cannot be zero".to_string(),
            ));
        }
        check_probability("mutation_rate", self.mutation_rate)?;
        check_probability(
            "random_initialisation_chance",
            self.random_initialisation_chance,
        )?;

        if self.optimal_fitness.is_nan() {
            return Err(SearchError::Configuration(
                "optimal_fitness cannot be NaN".to_string(),
            ));
        }
        match self.fitness_weights.first() {
            None => {
                return Err(SearchError::Configuration(
                    "fitness_weights needs one weight".to_string(),
                ))
            }
            Some(w) if !w.is_finite() || *w == 0.0 => {
                return Err(SearchError::Configuration(format!(
                    "fitness weight must be finite and non-zero, got {}",
                    w
                )))
            }
            Some(_) => {}
        }

        ChromosomeFactory::new(self.parameter_limits.clone())?;

        if self.output_file.trim().is_empty() {
            return Err(SearchError::Configuration(
                "output_file cannot be empty".to_string(),
            ));
        }
        if self.evaluation_timeout == Some(Duration::ZERO) {
            return Err(SearchError::Configuration(
                "evaluation_timeout must be positive".to_string(),
            ));
        }
        if self.max_concurrent_evaluations == Some(0) {
            return Err(SearchError::Configuration(
                "max_concurrent_evaluations cannot be zero".to_string(),
            ));
        }
        if let DedupPolicy::Epsilon(eps) = self.dedup {
            if !(eps >= 0.0 && eps.is_finite()) {
                return Err(SearchError::Configuration(format!(
                    "dedup epsilon must be a non-negative number, got {}",
                    eps
                )));
            }
        }
        Ok(())
    }
}

/// Fluent construction of a [`SearchConfig`].
#[derive(Debug, Clone)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
    parameters: Vec<ParameterSpec>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
            parameters: Vec::new(),
        }
    }

    pub fn mu(mut self, mu: usize) -> Self {
        self.config.mu = mu;
        self
    }

    pub fn lambda(mut self, lambda: usize) -> Self {
        self.config.lambda = lambda;
        self
    }

    pub fn max_generations(mut self, max_generations: usize) -> Self {
        self.config.max_generations = max_generations;
        self
    }

    pub fn max_time(mut self, max_time: Duration) -> Self {
        self.config.max_time = max_time;
        self
    }

    pub fn mutation_rate(mut self, rate: f64) -> Self {
        self.config.mutation_rate = rate;
        self
    }

    pub fn random_initialisation_chance(mut self, chance: f64) -> Self {
        self.config.random_initialisation_chance = chance;
        self
    }

    pub fn optimal_fitness(mut self, threshold: f64) -> Self {
        self.config.optimal_fitness = threshold;
        self
    }

    pub fn fitness_weights(mut self, weights: Vec<f64>) -> Self {
        self.config.fitness_weights = weights;
        self
    }

    /// Appends one gene. Any parameters added this way replace the default
    /// parameter list.
    pub fn parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn parameter_limits(mut self, specs: Vec<ParameterSpec>) -> Self {
        self.parameters = specs;
        self
    }

    pub fn output_file(mut self, file: impl Into<String>) -> Self {
        self.config.output_file = file.into();
        self
    }

    pub fn logged_stats(mut self, stats: Vec<Statistic>) -> Self {
        self.config.logged_stats = stats;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn evaluation_timeout(mut self, timeout: Duration) -> Self {
        self.config.evaluation_timeout = Some(timeout);
        self
    }

    pub fn max_concurrent_evaluations(mut self, n: usize) -> Self {
        self.config.max_concurrent_evaluations = Some(n);
        self
    }

    pub fn stop_on_optimal(mut self, stop: bool) -> Self {
        self.config.stop_on_optimal = stop;
        self
    }

    pub fn dedup(mut self, policy: DedupPolicy) -> Self {
        self.config.dedup = policy;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(mut self) -> Result<SearchConfig> {
        if !self.parameters.is_empty() {
            self.config.parameter_limits = self.parameters;
        }
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
