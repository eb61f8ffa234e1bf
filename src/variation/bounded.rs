//! # BoundedVariator
//!
//! Crossover and mutation for typed, bounded parameter vectors.
//!
//! - Crossover is uniform: each gene of the child comes from either parent
//!   with equal probability.
//! - Mutation touches each gene with probability `mutation_rate` (taken from
//!   the search context). Float genes take a gaussian step whose standard
//!   deviation is `step_scale` times the parameter's range; integer genes
//!   move by a non-zero uniform step of at most that many units (at least
//!   one). Results are clamped to the bounds, never reflected or resampled.

use crate::chromosome::{Chromosome, ParameterKind};
use crate::error::Result;
use crate::population::Population;
use crate::search::SearchContext;

use super::{ParentSelection, Variator};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct BoundedVariator {
    selection: ParentSelection,
    step_scale: f64,
}

impl Default for BoundedVariator {
    fn default() -> Self {
        Self {
            selection: ParentSelection::Uniform,
            step_scale: 0.1,
        }
    }
}

impl BoundedVariator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: ParentSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the mutation step as a fraction of each parameter's range.
    pub fn with_step_scale(mut self, step_scale: f64) -> Self {
        self.step_scale = step_scale.max(0.0);
        self
    }

    pub fn selection(&self) -> ParentSelection {
        self.selection
    }
}

impl Variator for BoundedVariator {
    fn select(
        &self,
        population: &Population,
        k: usize,
        ctx: &mut SearchContext,
    ) -> Result<Vec<Chromosome>> {
        self.selection.select(population, k, ctx.weight, &mut ctx.rng)
    }

    fn mate(
        &self,
        parent1: &Chromosome,
        parent2: &Chromosome,
        ctx: &mut SearchContext,
    ) -> Result<Chromosome> {
        let genes = parent1
            .genes()
            .iter()
            .zip(parent2.genes())
            .map(|(a, b)| if ctx.rng.chance(0.5) { *a } else { *b })
            .collect();
        ctx.factory.from_genes(genes)
    }

    fn mutate(&self, individual: Chromosome, ctx: &mut SearchContext) -> Result<Chromosome> {
        let mut genes = individual.genes().to_vec();
        let mut changed = false;

        for (gene, spec) in genes.iter_mut().zip(ctx.factory.specs()) {
            if !ctx.rng.chance(ctx.mutation_rate) {
                continue;
            }

            let std_dev = spec.span() * self.step_scale;
            let mutated = match spec.kind() {
                ParameterKind::Float => spec.clamp(gene.as_f64() + ctx.rng.gaussian(std_dev)),
                ParameterKind::Int => {
                    let width = (std_dev.round() as i64).max(1);
                    let mut step = ctx.rng.uniform_i64(-width, width - 1);
                    if step >= 0 {
                        step += 1;
                    }
                    spec.clamp(gene.as_f64() + step as f64)
                }
            };

            if mutated != *gene {
                *gene = mutated;
                changed = true;
            }
        }

        if !changed {
            return Ok(individual);
        }
        ctx.factory.from_genes(genes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::{ChromosomeFactory, ParameterSpec, ParameterValue};
    use crate::rng::RandomNumberGenerator;

    fn context(mutation_rate: f64) -> SearchContext {
        SearchContext::new(
            ChromosomeFactory::new(vec![
                ParameterSpec::int("prey", 0, 10),
                ParameterSpec::float("gain", 0.0, 1.0),
            ])
            .unwrap(),
            RandomNumberGenerator::from_seed(17),
            mutation_rate,
            1.0,
        )
    }

    #[test]
    fn test_mate_takes_genes_from_parents() {
        let mut ctx = context(0.0);
        let a = ctx
            .factory
            .from_genes(vec![ParameterValue::Int(1), ParameterValue::Float(0.1)])
            .unwrap();
        let b = ctx
            .factory
            .from_genes(vec![ParameterValue::Int(9), ParameterValue::Float(0.9)])
            .unwrap();

        for _ in 0..20 {
            let child = BoundedVariator::new().mate(&a, &b, &mut ctx).unwrap();
            assert!(child.id() > b.id());
            assert!(child.genes()[0] == a.genes()[0] || child.genes()[0] == b.genes()[0]);
            assert!(child.genes()[1] == a.genes()[1] || child.genes()[1] == b.genes()[1]);
        }
    }

    #[test]
    fn test_zero_rate_keeps_individual() {
        let mut ctx = context(0.0);
        let a = ctx.factory.random(&mut ctx.rng);
        let same = BoundedVariator::new().mutate(a.clone(), &mut ctx).unwrap();
        assert_eq!(same, a);
    }

    #[test]
    fn test_full_rate_changes_and_stays_in_bounds() {
        let mut ctx = context(1.0);
        let variator = BoundedVariator::new().with_step_scale(0.5);
        for _ in 0..100 {
            let a = ctx.factory.random(&mut ctx.rng);
            let mutated = variator.mutate(a.clone(), &mut ctx).unwrap();
            assert!(ctx.factory.contains(&mutated));
            if mutated != a {
                assert_ne!(mutated.id(), a.id());
            }
        }
    }

    #[test]
    fn test_widest_int_range_mutates() {
        let mut ctx = SearchContext::new(
            ChromosomeFactory::new(vec![ParameterSpec::int("n", i64::MIN, i64::MAX)]).unwrap(),
            RandomNumberGenerator::from_seed(4),
            1.0,
            1.0,
        );
        let variator = BoundedVariator::new();
        for _ in 0..50 {
            let a = ctx.factory.random(&mut ctx.rng);
            let mutated = variator.mutate(a, &mut ctx).unwrap();
            assert!(ctx.factory.contains(&mutated));
        }
    }
}
