//! Genetic-algorithm parameter search for agent-based simulations.
//!
//! A chromosome is a vector of typed, bounded simulation parameters; the
//! simulation is a black-box fitness oracle. See [`search::GeneticSearch`].

pub mod chromosome;
pub mod error;
pub mod experiment;
pub mod oracle;
pub mod population;
pub mod record;
pub mod rng;
pub mod search;
pub mod stats;
pub mod tracker;
pub mod variation;

// Re-export commonly used types for convenience
pub use chromosome::{Chromosome, ChromosomeFactory, ParameterSpec, ParameterValue};
pub use error::{OptionExt, Result, ResultExt, SearchError};
pub use oracle::FitnessOracle;
pub use search::{GeneticSearch, SearchConfig, SearchOutcome, StopReason};
pub use variation::{BoundedVariator, PlaceholderVariator, Variator};
