//! # Statistics
//!
//! Per-generation fitness statistics and the logbook they accumulate in.
//! The logbook is what ends up in the summary file at the end of a search:
//! a tab separated table with one row per generation.

use std::fmt;

use crate::error::{Result, SearchError};

/// A summary statistic over the fitness values of a population.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    Std,
    Min,
    Max,
}

impl Statistic {
    pub const ALL: [Statistic; 4] = [
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::Max,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::Max => "max",
        }
    }

    /// Parses a statistic name as used in configuration files.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name() == name)
            .ok_or_else(|| SearchError::Configuration(format!("unknown statistic '{}'", name)))
    }

    /// Computes the statistic; `None` for an empty slice.
    pub fn compute(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let value = match self {
            Statistic::Mean => values.iter().sum::<f64>() / n,
            Statistic::Std => {
                let mean = values.iter().sum::<f64>() / n;
                (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
            }
            Statistic::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Some(value)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One logbook row.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Evaluations spent producing this generation.
    pub evaluations: usize,
    /// Values of the logged statistics, in logbook column order.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Logbook {
    stats: Vec<Statistic>,
    records: Vec<GenerationRecord>,
}

impl Logbook {
    pub fn new(stats: Vec<Statistic>) -> Self {
        Self {
            stats,
            records: Vec::new(),
        }
    }

    /// Computes the logged statistics over `fitnesses` and appends a row.
    pub fn record(&mut self, generation: usize, evaluations: usize, fitnesses: &[f64]) -> &GenerationRecord {
        let values = self
            .stats
            .iter()
            .map(|s| s.compute(fitnesses).unwrap_or(f64::NAN))
            .collect();
        self.records.push(GenerationRecord {
            generation,
            evaluations,
            values,
        });
        &self.records[self.records.len() - 1]
    }

    pub fn stats(&self) -> &[Statistic] {
        &self.stats
    }

    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&GenerationRecord> {
        self.records.last()
    }

    /// Looks up the value of `stat` in a row.
    pub fn value(&self, record: &GenerationRecord, stat: Statistic) -> Option<f64> {
        let column = self.stats.iter().position(|s| *s == stat)?;
        record.values.get(column).copied()
    }

    /// Sum of the evaluations column.
    pub fn total_evaluations(&self) -> usize {
        self.records.iter().map(|r| r.evaluations).sum()
    }
}

impl fmt::Display for Logbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generation\tevaluations")?;
        for stat in &self.stats {
            write!(f, "\t{}", stat)?;
        }
        for record in &self.records {
            write!(f, "\n{}\t{}", record.generation, record.evaluations)?;
            for value in &record.values {
                write!(f, "\t{}", value)?;
            }
        }
        Ok(())
    }
}
