//! # RandomNumberGenerator
//!
//! The `RandomNumberGenerator` struct wraps a seedable `StdRng` and offers the
//! handful of draws the search needs: inclusive uniform reals and integers,
//! Bernoulli trials, and index picks.
//!
//! ## Example
//!
//! ```rust
//! use simsearch::rng::RandomNumberGenerator;
//!
//! let mut rng = RandomNumberGenerator::from_seed(7);
//! let x = rng.uniform_f64(0.0, 1.0);
//! let n = rng.uniform_i64(0, 10);
//!
//! assert!((0.0..=1.0).contains(&x));
//! assert!((0..=10).contains(&n));
//! ```

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// A wrapper around the `rand` crate's `StdRng`.
#[derive(Clone, Debug)]
pub struct RandomNumberGenerator {
    pub rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new `RandomNumberGenerator` instance seeded from the system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new `RandomNumberGenerator` instance with a specific seed.
    ///
    /// This is useful for reproducible searches and tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a real number uniformly from `[from, to]`, bounds inclusive.
    ///
    /// A degenerate range (`from == to`) returns `from`.
    pub fn uniform_f64(&mut self, from: f64, to: f64) -> f64 {
        if from >= to {
            return from;
        }
        self.rng.gen_range(from..=to)
    }

    /// Draws an integer uniformly from `[from, to]`, bounds inclusive.
    pub fn uniform_i64(&mut self, from: i64, to: i64) -> i64 {
        if from >= to {
            return from;
        }
        self.rng.gen_range(from..=to)
    }

    /// Returns `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.rng.gen_bool(p)
    }

    /// Picks an index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Draws from a normal distribution with mean 0 and the given standard
    /// deviation. A non-positive deviation yields 0.
    pub fn gaussian(&mut self, std_dev: f64) -> f64 {
        match Normal::new(0.0, std_dev) {
            Ok(normal) if std_dev > 0.0 => normal.sample(&mut self.rng),
            _ => 0.0,
        }
    }

    /// Draws a non-negative 63-bit seed.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.gen::<u64>() >> 1
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_f64_within_inclusive_bounds() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        for _ in 0..1000 {
            let x = rng.uniform_f64(-1.0, 1.0);
            assert!((-1.0..=1.0).contains(&x));
        }
    }

    #[test]
    fn test_uniform_i64_hits_both_ends() {
        let mut rng = RandomNumberGenerator::from_seed(2);
        let draws: Vec<i64> = (0..2000).map(|_| rng.uniform_i64(0, 3)).collect();
        assert!(draws.iter().all(|d| (0..=3).contains(d)));
        assert!(draws.contains(&0));
        assert!(draws.contains(&3));
    }

    #[test]
    fn test_degenerate_ranges() {
        let mut rng = RandomNumberGenerator::from_seed(3);
        assert_eq!(rng.uniform_f64(2.5, 2.5), 2.5);
        assert_eq!(rng.uniform_i64(4, 4), 4);
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = RandomNumberGenerator::from_seed(4);
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.0));
    }

    #[test]
    fn test_gaussian_zero_deviation() {
        let mut rng = RandomNumberGenerator::from_seed(5);
        assert_eq!(rng.gaussian(0.0), 0.0);
    }

    #[test]
    fn test_clone() {
        let mut rng1 = RandomNumberGenerator::from_seed(42);
        let mut rng2 = rng1.clone();

        // Both RNGs should generate the same sequence after cloning
        let nums1: Vec<f64> = (0..5).map(|_| rng1.uniform_f64(0.0, 1.0)).collect();
        let nums2: Vec<f64> = (0..5).map(|_| rng2.uniform_f64(0.0, 1.0)).collect();

        assert_eq!(nums1, nums2);
    }
}
