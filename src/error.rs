//! Error types for route optimization.

use thiserror::Error;

use crate::optimizer::Algorithm;

/// Result type alias for u-waypath operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a cost model or solving a route.
///
/// Cancellation is not an error: a cancelled solve returns its best-known
/// result with [`SolveResult::cancelled`](crate::SolveResult::cancelled) set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed waypoints, matrix, seed route, or configuration.
    ///
    /// Always fixable by the caller; never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The combinatorial engine could not be reached or initialized.
    ///
    /// Fall back to a heuristic solver.
    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    /// No valid route was found before the time limit.
    #[error("No feasible route: {0}")]
    Infeasible(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

/// A solve failure tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{algorithm} failed: {source}")]
pub struct OptimizeError {
    /// Algorithm that was selected for the run.
    pub algorithm: Algorithm,
    /// The underlying error, unchanged.
    #[source]
    pub source: Error,
}

impl OptimizeError {
    pub(crate) fn new(algorithm: Algorithm, source: Error) -> Self {
        Self { algorithm, source }
    }
}
