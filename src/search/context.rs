use crate::chromosome::ChromosomeFactory;
use crate::rng::RandomNumberGenerator;

/// Mutable state shared by the controller and the variation operators.
///
/// Owns the chromosome factory (and with it the lineage counter) and the
/// random source of one search. Operators receive it by `&mut` so every
/// random draw of a run comes from a single seeded generator.
#[derive(Debug)]
pub struct SearchContext {
    pub factory: ChromosomeFactory,
    pub rng: RandomNumberGenerator,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Sign and scale of the fitness objective; positive maximises.
    pub weight: f64,
    /// Generation being produced; 0 during initialisation.
    pub generation: usize,
}

impl SearchContext {
    pub fn new(
        factory: ChromosomeFactory,
        rng: RandomNumberGenerator,
        mutation_rate: f64,
        weight: f64,
    ) -> Self {
        Self {
            factory,
            rng,
            mutation_rate,
            weight,
            generation: 0,
        }
    }
}
