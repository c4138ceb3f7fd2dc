//! Solve result representation.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::distance::CostMatrix;
use crate::optimizer::Algorithm;
use crate::route::Route;

/// Annealing run statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnnealingStats {
    /// Temperature the run started at (configured or derived).
    pub initial_temperature: f64,
    /// Temperature when the run stopped.
    pub final_temperature: f64,
    /// Number of accepted moves (including improvements).
    pub accepted_moves: usize,
    /// Number of strictly improving moves.
    pub improving_moves: usize,
}

/// Result of a route optimization.
///
/// Plain owned data: it holds no handle into solver state and can be passed
/// to a renderer or another thread as is.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolveResult {
    /// The final route.
    pub route: Route,

    /// Sum of consecutive edge costs of `route` under the solve's matrix.
    pub total_cost: f64,

    /// Algorithm that produced the route.
    pub algorithm: Algorithm,

    /// Wall-clock time spent.
    pub elapsed: Duration,

    /// Number of iterations (annealing) or explored search nodes (exact).
    pub iterations: Option<usize>,

    /// Best cost sampled across the run. Non-increasing.
    pub convergence: Vec<f64>,

    /// Whether the run was cancelled before finishing.
    pub cancelled: bool,

    /// Whether the route is proven optimal (exact engine only).
    pub proven_optimal: bool,

    /// RNG seed actually used, so a run can be reproduced.
    pub seed: Option<u64>,

    /// Cost of the route the solver started from, if it refined one.
    pub initial_cost: Option<f64>,

    /// Cost of visiting the waypoints in their submitted order.
    pub baseline_cost: Option<f64>,

    /// Annealing statistics, for annealing runs.
    pub annealing: Option<AnnealingStats>,
}

impl SolveResult {
    /// Creates a result for `route`, computing its cost under `matrix`.
    pub fn new(route: Route, matrix: &CostMatrix, algorithm: Algorithm) -> Self {
        let total_cost = route.cost(matrix);
        Self {
            route,
            total_cost,
            algorithm,
            elapsed: Duration::ZERO,
            iterations: None,
            convergence: Vec::new(),
            cancelled: false,
            proven_optimal: false,
            seed: None,
            initial_cost: None,
            baseline_cost: None,
            annealing: None,
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Relative improvement over the baseline order, in `[0, 1]` when the
    /// route is better. `None` without a usable baseline.
    pub fn improvement(&self) -> Option<f64> {
        match self.baseline_cost {
            Some(base) if base.is_finite() && base > 0.0 => {
                Some((base - self.total_cost) / base)
            }
            _ => None,
        }
    }

    /// Whether the route has no blocked edge.
    pub fn is_feasible(&self) -> bool {
        self.total_cost.is_finite()
    }
}
