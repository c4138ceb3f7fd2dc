//! Routing engine interface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::RoutingModel;

/// Status of the engine after a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EngineStatus {
    /// Proven optimal tour found.
    Optimal,
    /// A tour was found, optimality not proven (time limit or cancellation).
    Feasible,
    /// The search space was exhausted without a tour.
    Infeasible,
    /// Stopped before any tour was found.
    Timeout,
}

/// How the engine builds its first tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FirstSolutionStrategy {
    /// Extend the tour from its end along the cheapest arc to an unvisited
    /// node.
    #[default]
    PathCheapestArc,
    /// Skip construction; the search finds the first tour itself.
    None,
}

/// Search parameters handed to the engine.
#[derive(Debug, Clone)]
pub struct SearchParameters {
    /// Hard wall-clock budget for the search.
    pub time_limit: Duration,
    /// First-solution construction.
    pub first_solution: FirstSolutionStrategy,
    /// Cooperative cancellation flag.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            first_solution: FirstSolutionStrategy::default(),
            cancel: None,
        }
    }
}

impl SearchParameters {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_first_solution(mut self, strategy: FirstSolutionStrategy) -> Self {
        self.first_solution = strategy;
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Whether the cancel flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Tour returned by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineSolution {
    /// Search status.
    pub status: EngineStatus,
    /// Node order starting at the depot, without the return to it.
    /// Empty when no tour was found.
    pub tour: Vec<usize>,
    /// Objective value of `tour`.
    pub objective: Option<i64>,
    /// Number of search nodes explored.
    pub explored: u64,
    /// Solve time.
    pub wall_time: Duration,
}

impl EngineSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: EngineStatus) -> Self {
        Self {
            status,
            tour: Vec::new(),
            objective: None,
            explored: 0,
            wall_time: Duration::ZERO,
        }
    }

    /// Whether a tour was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, EngineStatus::Optimal | EngineStatus::Feasible)
    }
}

/// Failures of the engine itself, as opposed to search outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not be initialized or refuses the model size.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    /// The model is malformed.
    #[error("invalid model: {0}")]
    ModelInvalid(String),
}

/// Trait for combinatorial routing engines.
///
/// Implementors own the whole search. This can wrap a native solver
/// (e.g. OR-Tools routing) or an in-process algorithm such as
/// [`BranchAndBoundEngine`](super::BranchAndBoundEngine). The call blocks
/// until the search finishes, the time limit expires, or the cancel flag
/// is raised.
pub trait RoutingEngine: Send + Sync {
    /// Engine name, for diagnostics.
    fn name(&self) -> &str;

    /// Searches for a minimum-cost tour of `model`.
    fn solve(
        &self,
        model: &RoutingModel,
        params: &SearchParameters,
    ) -> Result<EngineSolution, EngineError>;
}
