//! # FitnessOracle
//!
//! The `FitnessOracle` trait is the only thing the search knows about the
//! simulation: hand it a chromosome, get back one scalar fitness. Calls are
//! synchronous, and the search never reads a fitness before the call has
//! returned.
//!
//! ## Example
//!
//! ```rust
//! use simsearch::chromosome::{ChromosomeFactory, ParameterSpec};
//! use simsearch::oracle::{FitnessOracle, FnOracle};
//! use simsearch::rng::RandomNumberGenerator;
//!
//! let factory = ChromosomeFactory::new(vec![ParameterSpec::int("n", 0, 10)]).unwrap();
//! let chromosome = factory.random(&mut RandomNumberGenerator::from_seed(1));
//!
//! let oracle = FnOracle::new(|c: &simsearch::chromosome::Chromosome| Ok(c.values()[0]));
//! assert_eq!(oracle.evaluate(&chromosome).unwrap(), chromosome.values()[0]);
//! ```

pub mod cache;
pub mod simulation;

use std::fmt;
use std::sync::Arc;

use crate::chromosome::Chromosome;
use crate::error::Result;

pub use cache::CachedOracle;
pub use simulation::{
    ExitLog, LinearScore, ScoreTerm, ScoringFunction, SimulationOracle, Simulator,
    SimulatorFactory,
};

/// Scores a chromosome, typically by running a simulation configured from it.
pub trait FitnessOracle: Send + Sync {
    fn evaluate(&self, chromosome: &Chromosome) -> Result<f64>;
}

impl<O: FitnessOracle + ?Sized> FitnessOracle for Arc<O> {
    fn evaluate(&self, chromosome: &Chromosome) -> Result<f64> {
        (**self).evaluate(chromosome)
    }
}

impl<O: FitnessOracle + ?Sized> FitnessOracle for Box<O> {
    fn evaluate(&self, chromosome: &Chromosome) -> Result<f64> {
        (**self).evaluate(chromosome)
    }
}

/// Oracle with no simulation bound. Every chromosome scores 0.0, which keeps
/// the controller runnable without a simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderOracle;

impl FitnessOracle for PlaceholderOracle {
    fn evaluate(&self, _chromosome: &Chromosome) -> Result<f64> {
        Ok(0.0)
    }
}

/// Adapts a closure into an oracle.
#[derive(Clone)]
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&Chromosome) -> Result<f64> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnOracle<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOracle").finish_non_exhaustive()
    }
}

impl<F> FitnessOracle for FnOracle<F>
where
    F: Fn(&Chromosome) -> Result<f64> + Send + Sync,
{
    fn evaluate(&self, chromosome: &Chromosome) -> Result<f64> {
        (self.f)(chromosome)
    }
}
