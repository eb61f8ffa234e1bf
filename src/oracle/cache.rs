//! # Caching
//!
//! Memoises fitness by exact parameter vector. Simulations are expensive and
//! the variation operators readily reproduce a vector that was already
//! scored (identity mutation, fresh draws on small integer ranges), so
//! wrapping the oracle avoids running the same configuration twice.
//!
//! Only successful evaluations are cached. The wrapped oracle must be pure
//! for the cache to be sound.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::chromosome::Chromosome;
use crate::error::{Result, SearchError};

use super::FitnessOracle;

type GeneKey = Vec<(u8, u64)>;

/// A wrapper around an oracle that caches fitness evaluations.
#[derive(Debug, Clone)]
pub struct CachedOracle<O>
where
    O: FitnessOracle,
{
    oracle: O,
    cache: Arc<Mutex<HashMap<GeneKey, f64>>>,
}

impl<O> CachedOracle<O>
where
    O: FitnessOracle,
{
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns a reference to the wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.oracle
    }

    /// Returns the number of cached fitness evaluations.
    pub fn cache_size(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<GeneKey, f64>>> {
        self.cache
            .lock()
            .map_err(|_| SearchError::Oracle("fitness cache lock poisoned".to_string()))
    }
}

impl<O> FitnessOracle for CachedOracle<O>
where
    O: FitnessOracle,
{
    fn evaluate(&self, chromosome: &Chromosome) -> Result<f64> {
        let key = chromosome.gene_key();

        if let Some(fitness) = self.lock()?.get(&key) {
            return Ok(*fitness);
        }

        // The lock is not held while the simulation runs, so parallel
        // evaluations of distinct vectors do not serialise.
        let fitness = self.oracle.evaluate(chromosome)?;
        self.lock()?.insert(key, fitness);
        Ok(fitness)
    }
}
