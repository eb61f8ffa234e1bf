//! # Optimal-solution tracker
//!
//! Records every chromosome whose fitness crosses the configured optimal
//! threshold, once. Entries are never removed during a run. A cursor marks
//! which entries have already been written to the discoveries file, so the
//! controller only persists what is new each generation.

use chrono::{DateTime, Utc};

use crate::chromosome::{Chromosome, ParameterValue};

/// A chromosome that crossed the optimal threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalSolution {
    pub chromosome: Chromosome,
    pub fitness: f64,
    /// Generation in which the solution was first seen above the threshold.
    pub generation: usize,
    pub discovered_at: DateTime<Utc>,
}

/// When a candidate counts as already recorded.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DedupPolicy {
    /// Identical parameter vectors.
    #[default]
    Exact,
    /// Every parameter within `eps` of the recorded one.
    Epsilon(f64),
    /// Every parameter value of a recorded solution occurs somewhere in
    /// the candidate, regardless of position or multiplicity.
    Membership,
}

impl DedupPolicy {
    pub fn is_duplicate(&self, candidate: &Chromosome, existing: &Chromosome) -> bool {
        match *self {
            DedupPolicy::Exact => candidate.same_genes(existing),
            DedupPolicy::Epsilon(eps) => {
                candidate.len() == existing.len()
                    && candidate
                        .genes()
                        .iter()
                        .zip(existing.genes())
                        .all(|(a, b)| (a.as_f64() - b.as_f64()).abs() <= eps)
            }
            DedupPolicy::Membership => existing
                .genes()
                .iter()
                .all(|gene| candidate.genes().iter().any(|c| same_value(c, gene))),
        }
    }
}

fn same_value(a: &ParameterValue, b: &ParameterValue) -> bool {
    a.as_f64() == b.as_f64()
}

#[derive(Debug, Clone)]
pub struct OptimalSolutionTracker {
    threshold: f64,
    policy: DedupPolicy,
    solutions: Vec<OptimalSolution>,
    persisted: usize,
}

impl OptimalSolutionTracker {
    pub fn new(threshold: f64, policy: DedupPolicy) -> Self {
        Self {
            threshold,
            policy,
            solutions: Vec::new(),
            persisted: 0,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Records `chromosome` if its fitness strictly exceeds the threshold
    /// and no recorded solution duplicates it. Returns whether it was added.
    pub fn offer(
        &mut self,
        chromosome: &Chromosome,
        fitness: f64,
        generation: usize,
        now: DateTime<Utc>,
    ) -> bool {
        if fitness.is_nan() || fitness <= self.threshold {
            return false;
        }
        if self
            .solutions
            .iter()
            .any(|s| self.policy.is_duplicate(chromosome, &s.chromosome))
        {
            return false;
        }

        self.solutions.push(OptimalSolution {
            chromosome: chromosome.clone(),
            fitness,
            generation,
            discovered_at: now,
        });
        true
    }

    /// Solutions recorded since the previous call.
    pub fn drain_new(&mut self) -> &[OptimalSolution] {
        let start = self.persisted;
        self.persisted = self.solutions.len();
        &self.solutions[start..]
    }

    pub fn solutions(&self) -> &[OptimalSolution] {
        &self.solutions
    }

    pub fn into_solutions(self) -> Vec<OptimalSolution> {
        self.solutions
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}
