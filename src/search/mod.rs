//! # Search
//!
//! The generational controller and everything it is configured with.
//!
//! ## Example
//!
//! ```rust,no_run
//! use simsearch::chromosome::{Chromosome, ParameterSpec};
//! use simsearch::oracle::FnOracle;
//! use simsearch::search::{GeneticSearch, SearchConfig};
//! use simsearch::variation::BoundedVariator;
//!
//! let config = SearchConfig::builder()
//!     .mu(4)
//!     .lambda(2)
//!     .optimal_fitness(5.0)
//!     .parameter(ParameterSpec::int("n", 0, 10))
//!     .output_dir("runs")
//!     .build()?;
//!
//! let oracle = FnOracle::new(|c: &Chromosome| Ok(c.values()[0]));
//! let search = GeneticSearch::new(config, oracle, BoundedVariator::new())?;
//! let outcome = search.run()?;
//! println!("stopped: {}", outcome.stop_reason);
//! # Ok::<(), simsearch::error::SearchError>(())
//! ```

pub mod config;
pub mod context;
pub mod controller;
pub mod state;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use context::SearchContext;
pub use controller::GeneticSearch;
pub use state::{SearchOutcome, SearchState, StopReason};
