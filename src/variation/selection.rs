//! Parent selection schemes.

use crate::chromosome::Chromosome;
use crate::error::{Result, SearchError};
use crate::population::{compare_fitness, Population};
use crate::rng::RandomNumberGenerator;

/// How parents are drawn from the population. Draws are always with replacement.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParentSelection {
    /// Every member equally likely.
    #[default]
    Uniform,
    /// The best of `size` uniformly drawn members wins each draw.
    Tournament { size: usize },
}

impl ParentSelection {
    /// Draws `k` clones from `population`, ranking by `fitness * weight`.
    ///
    /// # Errors
    ///
    /// Returns an error if the population is empty or the tournament size is 0.
    pub fn select(
        &self,
        population: &Population,
        k: usize,
        weight: f64,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<Chromosome>> {
        let members = population.members();
        if members.is_empty() {
            return Err(SearchError::EmptyPopulation);
        }

        let mut selected = Vec::with_capacity(k);
        for _ in 0..k {
            let idx = match *self {
                ParentSelection::Uniform => rng.index(members.len()),
                ParentSelection::Tournament { size } => {
                    Self::run_tournament(population, size, weight, rng)?
                }
            };
            selected.push(members[idx].chromosome.clone());
        }
        Ok(selected)
    }

    /// Runs a single tournament and returns the index of the winner.
    fn run_tournament(
        population: &Population,
        size: usize,
        weight: f64,
        rng: &mut RandomNumberGenerator,
    ) -> Result<usize> {
        if size < 1 {
            return Err(SearchError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }

        let members = population.members();
        let mut best_idx = rng.index(members.len());
        for _ in 1..size {
            let idx = rng.index(members.len());
            let is_better = compare_fitness(
                members[idx].fitness * weight,
                members[best_idx].fitness * weight,
            )
            .is_gt();
            if is_better {
                best_idx = idx;
            }
        }
        Ok(best_idx)
    }
}
