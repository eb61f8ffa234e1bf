//! # Population
//!
//! Evaluated individuals and the size-bounded population that holds them.
//! An [`Individual`] can only be built with a fitness value, so a chromosome
//! that has not been through the oracle cannot end up ranked.

use std::cmp::Ordering;

use crate::chromosome::Chromosome;
use crate::error::{Result, SearchError};

/// Where an individual entered the current population from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Created by the initialiser in generation 0.
    Initial,
    /// Survived from an earlier generation.
    Incumbent,
    /// Produced during the generation that was just selected.
    Offspring,
}

/// A chromosome together with its fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub chromosome: Chromosome,
    pub fitness: f64,
    pub origin: Origin,
}

impl Individual {
    pub fn new(chromosome: Chromosome, fitness: f64, origin: Origin) -> Self {
        Self {
            chromosome,
            fitness,
            origin,
        }
    }
}

/// Ordered collection of at most `capacity` (mu) evaluated individuals.
#[derive(Debug, Clone)]
pub struct Population {
    capacity: usize,
    members: Vec<Individual>,
}

impl Population {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            members: Vec::with_capacity(capacity),
        }
    }

    /// Replaces the members with the seeded individuals.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Configuration` if more than `capacity`
    /// individuals are supplied.
    pub fn seed(&mut self, individuals: Vec<Individual>) -> Result<()> {
        self.replace(individuals)
    }

    /// Wholesale replacement; the only way a population changes.
    pub fn replace(&mut self, next: Vec<Individual>) -> Result<()> {
        if next.len() > self.capacity {
            return Err(SearchError::Configuration(format!(
                "Population holds at most {} individuals, got {}",
                self.capacity,
                next.len()
            )));
        }
        self.members = next;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.members.iter()
    }

    pub fn members(&self) -> &[Individual] {
        &self.members
    }

    pub fn fitnesses(&self) -> Vec<f64> {
        self.members.iter().map(|i| i.fitness).collect()
    }

    /// The member ranked first under `weight` (positive maximises, negative minimises).
    pub fn best(&self, weight: f64) -> Option<&Individual> {
        self.members
            .iter()
            .max_by(|a, b| compare_fitness(a.fitness * weight, b.fitness * weight))
    }

    pub fn into_members(self) -> Vec<Individual> {
        self.members
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Individual;
    type IntoIter = std::slice::Iter<'a, Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Total order over fitness values; NaN ranks below every number.
pub fn compare_fitness(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| {
        if a.is_nan() && b.is_nan() {
            Ordering::Equal
        } else if a.is_nan() {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    })
}

/// Merges incumbents and offspring and keeps the best `mu`.
///
/// Individuals are ranked by `fitness * weight` in descending order. On equal
/// weighted fitness an offspring is ranked ahead of an incumbent, so a cut
/// that falls inside a tie keeps the newer individual. Returns the next
/// generation and how many offspring made it in.
pub fn favour_offspring(
    population: Vec<Individual>,
    offspring: Vec<Individual>,
    mu: usize,
    weight: f64,
) -> (Vec<Individual>, usize) {
    let mut choice: Vec<(Individual, bool)> = population
        .into_iter()
        .map(|ind| (ind, false))
        .chain(offspring.into_iter().map(|ind| (ind, true)))
        .collect();

    choice.sort_by(|(a, a_new), (b, b_new)| {
        compare_fitness(b.fitness * weight, a.fitness * weight).then_with(|| b_new.cmp(a_new))
    });
    choice.truncate(mu);

    let survivors = choice.iter().filter(|(_, is_new)| *is_new).count();
    let next = choice
        .into_iter()
        .map(|(mut ind, is_new)| {
            ind.origin = if is_new {
                Origin::Offspring
            } else {
                Origin::Incumbent
            };
            ind
        })
        .collect();

    (next, survivors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::{ChromosomeFactory, ParameterSpec, ParameterValue};

    fn individuals(factory: &ChromosomeFactory, values: &[i64], origin: Origin) -> Vec<Individual> {
        values
            .iter()
            .map(|&v| {
                let chromosome = factory.from_genes(vec![ParameterValue::Int(v)]).unwrap();
                Individual::new(chromosome, v as f64, origin)
            })
            .collect()
    }

    fn factory() -> ChromosomeFactory {
        ChromosomeFactory::new(vec![ParameterSpec::int("n", 0, 100)]).unwrap()
    }

    #[test]
    fn test_keeps_exactly_mu_best() {
        let factory = factory();
        let population = individuals(&factory, &[1, 7, 3, 9], Origin::Initial);
        let offspring = individuals(&factory, &[8, 2], Origin::Offspring);

        let (next, survivors) = favour_offspring(population, offspring, 4, 1.0);

        assert_eq!(next.len(), 4);
        assert_eq!(
            next.iter().map(|i| i.fitness).collect::<Vec<_>>(),
            vec![9.0, 8.0, 7.0, 3.0]
        );
        assert_eq!(survivors, 1);
        assert_eq!(next[1].origin, Origin::Offspring);
        assert_eq!(next[0].origin, Origin::Incumbent);
    }

    #[test]
    fn test_tie_prefers_offspring() {
        let factory = factory();
        let population = individuals(&factory, &[5, 4], Origin::Incumbent);
        let offspring = individuals(&factory, &[4], Origin::Offspring);
        let newcomer = offspring[0].chromosome.id();

        let (next, survivors) = favour_offspring(population, offspring, 2, 1.0);

        assert_eq!(survivors, 1);
        assert_eq!(next[1].chromosome.id(), newcomer);
    }

    #[test]
    fn test_negative_weight_minimises() {
        let factory = factory();
        let population = individuals(&factory, &[1, 7], Origin::Incumbent);
        let offspring = individuals(&factory, &[3], Origin::Offspring);

        let (next, _) = favour_offspring(population, offspring, 2, -1.0);

        assert_eq!(
            next.iter().map(|i| i.fitness).collect::<Vec<_>>(),
            vec![1.0, 3.0]
        );
    }

    #[test]
    fn test_replace_respects_capacity() {
        let factory = factory();
        let mut population = Population::new(2);
        assert!(population
            .seed(individuals(&factory, &[1, 2, 3], Origin::Initial))
            .is_err());
        population
            .seed(individuals(&factory, &[1, 2], Origin::Initial))
            .unwrap();
        assert_eq!(population.len(), 2);
        assert_eq!(population.best(1.0).unwrap().fitness, 2.0);
        assert_eq!(population.best(-1.0).unwrap().fitness, 1.0);
    }

    #[test]
    fn test_nan_ranks_last() {
        assert_eq!(compare_fitness(f64::NAN, 1.0), Ordering::Less);
        assert_eq!(compare_fitness(1.0, f64::NAN), Ordering::Greater);
        assert_eq!(compare_fitness(f64::NAN, f64::NAN), Ordering::Equal);
    }
}
