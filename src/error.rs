//! # Error Types
//!
//! This module defines the error type shared by every part of the search.
//! Configuration problems are reported before any fitness evaluation
//! starts; oracle, variation and I/O failures abort the running search and
//! are handed back to the caller unchanged. Nothing in this crate retries.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use simsearch::error::{SearchError, Result};
//!
//! fn check_rate(rate: f64) -> Result<f64> {
//!     if !(0.0..=1.0).contains(&rate) {
//!         return Err(SearchError::Configuration(format!(
//!             "rate {} is not a probability",
//!             rate
//!         )));
//!     }
//!     Ok(rate)
//! }
//!
//! assert!(check_rate(0.5).is_ok());
//! assert!(check_rate(1.5).is_err());
//! ```
//!
//! Using the `ResultExt` trait to add context to foreign errors:
//!
//! ```rust
//! use simsearch::error::{Result, ResultExt};
//! use std::fs::File;
//!
//! fn open_initial_state(path: &str) -> Result<()> {
//!     File::open(path).context("Failed to open initial state file")?;
//!     Ok(())
//! }
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use simsearch::error::{SearchError, OptionExt};
//!
//! fn best(fitness: &[f64]) -> simsearch::error::Result<f64> {
//!     fitness
//!         .iter()
//!         .cloned()
//!         .fold(None, |acc: Option<f64>, f| Some(acc.map_or(f, |a| a.max(f))))
//!         .ok_or_else_search(|| SearchError::EmptyPopulation)
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Represents errors that can occur while configuring or running a search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// An invalid configuration was provided (bad bounds, empty parameter
    /// list, zero population size, probabilities outside `[0, 1]`, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation needed at least one individual.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// The fitness oracle or the simulation behind it failed.
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// A simulation finished but its exit log lacked the expected outputs.
    #[error("Malformed simulation result: {0}")]
    MalformedResult(String),

    /// The oracle returned a fitness that cannot be ranked.
    #[error("Fitness calculation error: {0}")]
    FitnessCalculation(String),

    /// A single evaluation exceeded the configured timeout.
    #[error("Evaluation of chromosome {chromosome} timed out after {timeout:?}")]
    EvaluationTimeout { chromosome: u64, timeout: Duration },

    /// A variation operator (select, mate, mutate) failed.
    #[error("Variation error: {0}")]
    Variation(String),

    /// The checkpoint file for this run already exists.
    #[error("Run collision: checkpoint file {0} already exists")]
    RunCollision(String),

    /// An I/O operation on a checkpoint or log file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use simsearch::error::ResultExt;
/// use std::fs::File;
///
/// fn read_file(path: &str) -> simsearch::error::Result<()> {
///     File::open(path).context("Failed to open file")?;
///     Ok(())
/// }
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error to a `SearchError::Other` prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| SearchError::Other(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T>` using `err_fn` for `None`.
    fn ok_or_else_search<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> SearchError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_search<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> SearchError,
    {
        self.ok_or_else(err_fn)
    }
}
