use std::fmt;

use chrono::{DateTime, Utc};

use crate::population::Population;
use crate::record::RunId;
use crate::stats::Logbook;
use crate::tracker::OptimalSolution;

/// Phases of a search. The controller moves through them in this order,
/// looping from `Checkpointing` back to `GeneratingOffspring` until a
/// termination condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchState {
    Init,
    EvaluatingInitial,
    GeneratingOffspring,
    EvaluatingOffspring,
    Selecting,
    Checkpointing,
    Terminated,
}

impl SearchState {
    /// Whether the controller may move from `self` to `next`.
    pub fn can_transition_to(&self, next: SearchState) -> bool {
        use SearchState::*;
        matches!(
            (self, next),
            (Init, EvaluatingInitial)
                | (EvaluatingInitial, GeneratingOffspring)
                | (GeneratingOffspring, EvaluatingOffspring)
                | (EvaluatingOffspring, Selecting)
                | (Selecting, Checkpointing)
                | (Checkpointing, GeneratingOffspring)
                | (Checkpointing, Terminated)
        )
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchState::Init => "INIT",
            SearchState::EvaluatingInitial => "EVALUATING_INITIAL",
            SearchState::GeneratingOffspring => "GENERATING_OFFSPRING",
            SearchState::EvaluatingOffspring => "EVALUATING_OFFSPRING",
            SearchState::Selecting => "SELECTING",
            SearchState::Checkpointing => "CHECKPOINTING",
            SearchState::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxGenerations,
    MaxTime,
    OptimalFound,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::MaxGenerations => "max generations reached",
            StopReason::MaxTime => "time budget exhausted",
            StopReason::OptimalFound => "optimal solution found",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Everything a finished search hands back.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub run_id: RunId,
    /// Post-initial generations completed.
    pub generations: usize,
    /// Fitness evaluations, initial population included.
    pub evaluations: usize,
    pub population: Population,
    pub optimal_solutions: Vec<OptimalSolution>,
    pub logbook: Logbook,
    pub stop_reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SearchOutcome {
    /// Best member of the final population.
    pub fn best(&self, weight: f64) -> Option<&crate::population::Individual> {
        self.population.best(weight)
    }
}
