//! # Chromosome
//!
//! A chromosome is a fixed-length vector of typed, bounded scalar parameters
//! plus a lineage id. Chromosomes are never edited in place: crossover,
//! mutation and random creation all go through [`ChromosomeFactory`], which
//! hands out a fresh lineage id for every new chromosome.
//!
//! ## Example
//!
//! ```rust
//! use simsearch::chromosome::{ChromosomeFactory, ParameterSpec};
//! use simsearch::rng::RandomNumberGenerator;
//!
//! let factory = ChromosomeFactory::new(vec![
//!     ParameterSpec::int("PREY_POPULATION_TO_GENERATE", 0, 400),
//!     ParameterSpec::float("PREY_REPRODUCTION_CHANCE", 0.0, 0.25),
//! ])
//! .unwrap();
//!
//! let mut rng = RandomNumberGenerator::from_seed(11);
//! let population = factory.population(4, &mut rng);
//!
//! assert_eq!(population.len(), 4);
//! assert!(population.iter().all(|c| factory.contains(c)));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, SearchError};
use crate::rng::RandomNumberGenerator;

/// Identifier assigned to a chromosome at creation. Never reused within a search.
pub type LineageId = u64;

/// Number of decimal digits kept for float parameters.
pub const FLOAT_PRECISION: i32 = 6;

/// Rounds a float parameter to [`FLOAT_PRECISION`] decimal digits.
pub fn round_to_precision(value: f64) -> f64 {
    let scale = 10f64.powi(FLOAT_PRECISION);
    (value * scale).round() / scale
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Int,
    Float,
}

/// A single tagged parameter value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Int(_) => ParameterKind::Int,
            ParameterValue::Float(_) => ParameterKind::Float,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            ParameterValue::Int(v) => v as f64,
            ParameterValue::Float(v) => v,
        }
    }

    /// Bit pattern used for exact comparisons and hashing.
    pub(crate) fn key_bits(&self) -> (u8, u64) {
        match *self {
            ParameterValue::Int(v) => (0, v as u64),
            // Fold -0.0 into 0.0 so that the two compare equal.
            ParameterValue::Float(v) => (1, if v == 0.0 { 0 } else { v.to_bits() }),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Int(v) => write!(f, "{}", v),
            ParameterValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// Inclusive bounds of a parameter. The variant decides the parameter kind.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
}

/// Name and bounds of one searched parameter.
///
/// Bounds are only used when a chromosome is created or varied; the fitness
/// oracle never sees them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub bounds: Bounds,
}

impl ParameterSpec {
    pub fn int(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            bounds: Bounds::Int { min, max },
        }
    }

    pub fn float(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            bounds: Bounds::Float { min, max },
        }
    }

    pub fn kind(&self) -> ParameterKind {
        match self.bounds {
            Bounds::Int { .. } => ParameterKind::Int,
            Bounds::Float { .. } => ParameterKind::Float,
        }
    }

    /// Width of the range as a float.
    pub fn span(&self) -> f64 {
        match self.bounds {
            Bounds::Int { min, max } => max as f64 - min as f64,
            Bounds::Float { min, max } => max - min,
        }
    }

    /// Rejects `min > max`, non-finite float bounds and float ranges too wide
    /// to sample. Bounds are never swapped.
    pub fn validate(&self) -> Result<()> {
        match self.bounds {
            Bounds::Int { min, max } if min > max => Err(SearchError::Configuration(format!(
                "Parameter '{}' has min {} greater than max {}",
                self.name, min, max
            ))),
            Bounds::Float { min, max } if !min.is_finite() || !max.is_finite() => {
                Err(SearchError::Configuration(format!(
                    "Parameter '{}' has non-finite bounds [{}, {}]",
                    self.name, min, max
                )))
            }
            Bounds::Float { min, max } if min > max => Err(SearchError::Configuration(format!(
                "Parameter '{}' has min {} greater than max {}",
                self.name, min, max
            ))),
            Bounds::Float { min, max } if !(max - min).is_finite() => {
                Err(SearchError::Configuration(format!(
                    "Parameter '{}' has a range [{}, {}] wider than f64 can represent",
                    self.name, min, max
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn contains(&self, value: &ParameterValue) -> bool {
        match (self.bounds, *value) {
            (Bounds::Int { min, max }, ParameterValue::Int(v)) => (min..=max).contains(&v),
            (Bounds::Float { min, max }, ParameterValue::Float(v)) => {
                v.is_finite() && v >= min && v <= max
            }
            _ => false,
        }
    }

    /// Draws a value uniformly within the bounds. Floats are rounded to
    /// [`FLOAT_PRECISION`] digits and then kept inside the bounds.
    pub fn sample(&self, rng: &mut RandomNumberGenerator) -> ParameterValue {
        match self.bounds {
            Bounds::Int { min, max } => ParameterValue::Int(rng.uniform_i64(min, max)),
            Bounds::Float { min, max } => {
                let raw = rng.uniform_f64(min, max);
                ParameterValue::Float(round_to_precision(raw).clamp(min, max))
            }
        }
    }

    /// Coerces a raw number into this parameter's kind and bounds.
    pub fn clamp(&self, raw: f64) -> ParameterValue {
        match self.bounds {
            Bounds::Int { min, max } => {
                let rounded = if raw.is_finite() { raw.round() } else { min as f64 };
                ParameterValue::Int((rounded as i64).clamp(min, max))
            }
            Bounds::Float { min, max } => {
                let value = if raw.is_finite() { raw } else { min };
                ParameterValue::Float(round_to_precision(value).clamp(min, max))
            }
        }
    }
}

/// An immutable candidate parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    id: LineageId,
    genes: Vec<ParameterValue>,
}

impl Chromosome {
    pub fn id(&self) -> LineageId {
        self.id
    }

    pub fn genes(&self) -> &[ParameterValue] {
        &self.genes
    }

    pub fn gene(&self, index: usize) -> Option<ParameterValue> {
        self.genes.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Gene values widened to `f64`, in parameter order.
    pub fn values(&self) -> Vec<f64> {
        self.genes.iter().map(ParameterValue::as_f64).collect()
    }

    /// Exact gene equality, ignoring lineage ids.
    pub fn same_genes(&self, other: &Chromosome) -> bool {
        self.genes.len() == other.genes.len()
            && self
                .genes
                .iter()
                .zip(&other.genes)
                .all(|(a, b)| a.key_bits() == b.key_bits())
    }

    pub(crate) fn gene_key(&self) -> Vec<(u8, u64)> {
        self.genes.iter().map(ParameterValue::key_bits).collect()
    }
}

/// The creation operator: owns the parameter specifications and the single
/// lineage counter of a search.
#[derive(Debug)]
pub struct ChromosomeFactory {
    specs: Vec<ParameterSpec>,
    next_id: AtomicU64,
}

impl ChromosomeFactory {
    /// Validates `specs` and creates a factory whose first chromosome gets id 0.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Configuration` when the list is empty, a name is
    /// repeated, or any bound is invalid.
    pub fn new(specs: Vec<ParameterSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(SearchError::Configuration(
                "At least one parameter must be searched".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for spec in &specs {
            spec.validate()?;
            if !names.insert(spec.name.as_str()) {
                return Err(SearchError::Configuration(format!(
                    "Parameter '{}' is declared more than once",
                    spec.name
                )));
            }
        }

        Ok(Self {
            specs,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Number of lineage ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }

    fn next_id(&self) -> LineageId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Creates a chromosome with every gene drawn uniformly within its bounds.
    pub fn random(&self, rng: &mut RandomNumberGenerator) -> Chromosome {
        let genes = self.specs.iter().map(|spec| spec.sample(rng)).collect();
        Chromosome {
            id: self.next_id(),
            genes,
        }
    }

    /// Creates `size` random chromosomes with consecutive lineage ids.
    pub fn population(&self, size: usize, rng: &mut RandomNumberGenerator) -> Vec<Chromosome> {
        (0..size).map(|_| self.random(rng)).collect()
    }

    /// Wraps explicit gene values into a new chromosome.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Variation` when the length, a kind or a bound
    /// does not match the specifications.
    pub fn from_genes(&self, genes: Vec<ParameterValue>) -> Result<Chromosome> {
        if genes.len() != self.specs.len() {
            return Err(SearchError::Variation(format!(
                "Expected {} genes, got {}",
                self.specs.len(),
                genes.len()
            )));
        }

        for (spec, gene) in self.specs.iter().zip(&genes) {
            if !spec.contains(gene) {
                return Err(SearchError::Variation(format!(
                    "Value {} is not a valid {:?} for parameter '{}'",
                    gene,
                    spec.kind(),
                    spec.name
                )));
            }
        }

        Ok(Chromosome {
            id: self.next_id(),
            genes,
        })
    }

    /// True when every gene lies within its declared bounds.
    pub fn contains(&self, chromosome: &Chromosome) -> bool {
        chromosome.len() == self.specs.len()
            && self
                .specs
                .iter()
                .zip(chromosome.genes())
                .all(|(spec, gene)| spec.contains(gene))
    }

    /// Pairs each gene with the name of its parameter.
    pub fn named<'a>(
        &'a self,
        chromosome: &'a Chromosome,
    ) -> impl Iterator<Item = (&'a str, ParameterValue)> + 'a {
        self.specs
            .iter()
            .zip(chromosome.genes())
            .map(|(spec, gene)| (spec.name.as_str(), *gene))
    }
}
