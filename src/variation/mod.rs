//! # Variator
//!
//! The `Variator` trait groups the three operators that turn the current
//! population into offspring: parent selection, mating and mutation.
//! Chromosome parameters are typed and bounded rather than bitstrings, so
//! operators are supplied as strategies instead of being fixed.
//!
//! Two strategies ship with the crate:
//!
//! - [`PlaceholderVariator`]: mate ignores the parents and creates a fresh
//!   random chromosome, mutate is the identity. Enough to drive a random
//!   search and to test the controller.
//! - [`BoundedVariator`]: uniform crossover and bounded per-gene mutation.
//!
//! ## Implementing the trait
//!
//! ```rust
//! use simsearch::chromosome::Chromosome;
//! use simsearch::error::Result;
//! use simsearch::search::SearchContext;
//! use simsearch::variation::Variator;
//!
//! #[derive(Debug)]
//! struct CloneFirstParent;
//!
//! impl Variator for CloneFirstParent {
//!     fn mate(&self, parent1: &Chromosome, _parent2: &Chromosome, ctx: &mut SearchContext) -> Result<Chromosome> {
//!         ctx.factory.from_genes(parent1.genes().to_vec())
//!     }
//!
//!     fn mutate(&self, individual: Chromosome, _ctx: &mut SearchContext) -> Result<Chromosome> {
//!         Ok(individual)
//!     }
//! }
//! ```

pub mod bounded;
pub mod selection;

use std::fmt::Debug;

use crate::chromosome::Chromosome;
use crate::error::Result;
use crate::population::Population;
use crate::search::SearchContext;

pub use bounded::BoundedVariator;
pub use selection::ParentSelection;

/// Selection, crossover and mutation for one search.
pub trait Variator: Debug + Send + Sync {
    /// Picks `k` parents from `population`.
    ///
    /// The default draws uniformly at random with replacement. Returned
    /// chromosomes are clones, so nothing done to them reaches the
    /// population's own storage.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::EmptyPopulation` when there is nothing to select from.
    fn select(
        &self,
        population: &Population,
        k: usize,
        ctx: &mut SearchContext,
    ) -> Result<Vec<Chromosome>> {
        ParentSelection::Uniform.select(population, k, ctx.weight, &mut ctx.rng)
    }

    /// Produces one child from two parents.
    fn mate(
        &self,
        parent1: &Chromosome,
        parent2: &Chromosome,
        ctx: &mut SearchContext,
    ) -> Result<Chromosome>;

    /// Perturbs one individual. A changed individual must be a new
    /// chromosome (new lineage id); an unchanged one may be returned as is.
    fn mutate(&self, individual: Chromosome, ctx: &mut SearchContext) -> Result<Chromosome>;
}

/// Mate creates a fresh random individual, mutate does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderVariator;

impl Variator for PlaceholderVariator {
    fn mate(
        &self,
        _parent1: &Chromosome,
        _parent2: &Chromosome,
        ctx: &mut SearchContext,
    ) -> Result<Chromosome> {
        Ok(ctx.factory.random(&mut ctx.rng))
    }

    fn mutate(&self, individual: Chromosome, _ctx: &mut SearchContext) -> Result<Chromosome> {
        Ok(individual)
    }
}
