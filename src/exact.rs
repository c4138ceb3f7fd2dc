//! Exact route solving through a combinatorial routing engine.
//!
//! The adapter formulates the route as a single-vehicle routing model with
//! integer arc costs, hands it to a [`RoutingEngine`] and maps the engine's
//! tour back into a [`Route`] over the original waypoints.
//!
//! Open routes are expressed as closed tours:
//!
//! - fixed start: every arc back to the start costs zero;
//! - free start: an extra dummy depot is connected to every waypoint by
//!   zero-cost arcs, and removed from the returned tour.
//!
//! Time-limit expiry is a soft degradation: the best tour found is returned
//! with `proven_optimal = false`.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::distance::CostMatrix;
use crate::engine::{
    EngineStatus, FirstSolutionStrategy, RoutingEngine, RoutingModel, SearchParameters,
};
use crate::error::{Error, Result};
use crate::optimizer::Algorithm;
use crate::result::SolveResult;
use crate::route::{check_permutation, Route, RouteKind};

/// Default multiplier turning real costs into integer arc costs.
pub const DEFAULT_COST_SCALE: f64 = 100.0;

/// Configuration for the exact solver.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_waypath::exact::ExactConfig;
/// use u_waypath::RouteKind;
///
/// let config = ExactConfig::default()
///     .with_time_limit(Duration::from_secs(5))
///     .with_route_kind(RouteKind::Open)
///     .with_start(0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExactConfig {
    /// Wall-clock budget handed to the engine.
    pub time_limit: Duration,
    /// Arc cost = `round(cost * cost_scale)`.
    pub cost_scale: f64,
    /// Open path or closed tour.
    pub route_kind: RouteKind,
    /// First waypoint. Closed tours default to waypoint 0; open routes
    /// without a start let the engine choose both ends.
    pub start: Option<usize>,
    /// First-solution strategy requested from the engine.
    pub first_solution: FirstSolutionStrategy,
}

impl Default for ExactConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            cost_scale: DEFAULT_COST_SCALE,
            route_kind: RouteKind::default(),
            start: None,
            first_solution: FirstSolutionStrategy::default(),
        }
    }
}

impl ExactConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_cost_scale(mut self, scale: f64) -> Self {
        self.cost_scale = scale;
        self
    }

    pub fn with_route_kind(mut self, kind: RouteKind) -> Self {
        self.route_kind = kind;
        self
    }

    pub fn with_start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_first_solution(mut self, strategy: FirstSolutionStrategy) -> Self {
        self.first_solution = strategy;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.cost_scale.is_finite() || self.cost_scale <= 0.0 {
            return Err(Error::invalid(format!(
                "cost_scale must be positive, got {}",
                self.cost_scale
            )));
        }
        Ok(())
    }
}

/// Model handed to the engine, plus what is needed to read its tour back.
struct Formulation {
    model: RoutingModel,
    dummy_depot: Option<usize>,
}

fn formulate(matrix: &CostMatrix, config: &ExactConfig) -> Result<Formulation> {
    let n = matrix.size();
    if let Some(start) = config.start {
        if start >= n {
            return Err(Error::invalid(format!(
                "start index {start} out of range for {n} waypoints"
            )));
        }
    }

    let (nodes, depot, dummy_depot) = match (config.route_kind, config.start) {
        (RouteKind::Closed, start) => (n, start.unwrap_or(0), None),
        (RouteKind::Open, Some(start)) => (n, start, None),
        (RouteKind::Open, None) => (n + 1, n, Some(n)),
    };

    // Any tour sums `nodes` arcs; keep the worst one far from i64::MAX.
    let worst = matrix.max_finite_cost() * config.cost_scale * nodes as f64;
    if worst >= (i64::MAX / 4) as f64 {
        return Err(Error::invalid(format!(
            "costs too large for integer scaling by {}",
            config.cost_scale
        )));
    }

    let mut model = RoutingModel::new(nodes, depot);
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let cost = matrix.get(i, j);
            let arc = cost
                .is_finite()
                .then(|| (cost * config.cost_scale).round() as i64);
            model.set_arc_cost(i, j, arc);
        }
    }

    match dummy_depot {
        Some(dummy) => {
            for v in 0..n {
                model.set_arc_cost(dummy, v, Some(0));
                model.set_arc_cost(v, dummy, Some(0));
            }
        }
        None if config.route_kind == RouteKind::Open => {
            for v in (0..n).filter(|&v| v != depot) {
                model.set_arc_cost(v, depot, Some(0));
            }
        }
        None => {}
    }

    Ok(Formulation { model, dummy_depot })
}

/// Exact solver delegating the search to a [`RoutingEngine`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_waypath::distance::compute_cost_matrix;
/// use u_waypath::engine::BranchAndBoundEngine;
/// use u_waypath::exact::ExactSolver;
/// use u_waypath::Waypoint;
///
/// let wps = Waypoint::from_points(&[
///     (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (10.0, 10.0, 0.0), (0.0, 10.0, 0.0),
/// ]);
/// let m = compute_cost_matrix(&wps, None).unwrap();
/// let engine = BranchAndBoundEngine::default();
/// let result = ExactSolver::new(&engine).solve(&m, Duration::from_secs(5)).unwrap();
/// assert!((result.total_cost - 40.0).abs() < 1e-9);
/// assert!(result.proven_optimal);
/// ```
pub struct ExactSolver<'e> {
    engine: &'e dyn RoutingEngine,
}

impl<'e> ExactSolver<'e> {
    pub fn new(engine: &'e dyn RoutingEngine) -> Self {
        Self { engine }
    }

    /// Solves a closed tour from waypoint 0 within `time_limit`.
    pub fn solve(&self, matrix: &CostMatrix, time_limit: Duration) -> Result<SolveResult> {
        let config = ExactConfig::default().with_time_limit(time_limit);
        self.solve_with_config(matrix, &config, None)
    }

    /// Solves with full configuration and an optional cancel flag.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`]: bad configuration or start index.
    /// - [`Error::SolverUnavailable`]: the engine refused the model or
    ///   returned a tour that is not a permutation.
    /// - [`Error::Infeasible`]: no tour was found (no finite route exists,
    ///   or the limit expired first).
    pub fn solve_with_config(
        &self,
        matrix: &CostMatrix,
        config: &ExactConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolveResult> {
        config.validate()?;
        let started = Instant::now();
        let n = matrix.size();
        let formulation = formulate(matrix, config)?;

        let mut params = SearchParameters::default()
            .with_time_limit(config.time_limit)
            .with_first_solution(config.first_solution);
        if let Some(flag) = cancel {
            params = params.with_cancel(flag);
        }

        log::info!(
            "exact solve: {n} waypoints on engine '{}', limit {:?}",
            self.engine.name(),
            config.time_limit
        );
        let solution = self
            .engine
            .solve(&formulation.model, &params)
            .map_err(|e| Error::SolverUnavailable(e.to_string()))?;

        match solution.status {
            EngineStatus::Optimal | EngineStatus::Feasible => {}
            EngineStatus::Infeasible => {
                return Err(Error::Infeasible(
                    "no route uses only finite edges".into(),
                ));
            }
            EngineStatus::Timeout => {
                return Err(Error::Infeasible(format!(
                    "no route found within {:?}",
                    config.time_limit
                )));
            }
        }

        let order: Vec<usize> = match formulation.dummy_depot {
            Some(dummy) => {
                if solution.tour.first() != Some(&dummy) {
                    return Err(Error::SolverUnavailable(
                        "engine tour does not start at the depot".into(),
                    ));
                }
                solution.tour[1..].to_vec()
            }
            None => solution.tour.clone(),
        };
        check_permutation(&order, n)
            .map_err(|e| Error::SolverUnavailable(format!("engine returned a bad tour: {e}")))?;

        let proven = solution.status == EngineStatus::Optimal;
        if !proven {
            log::warn!(
                "exact solve stopped before proving optimality ({} nodes explored)",
                solution.explored
            );
        }

        let mut result = SolveResult::new(
            Route::new(order, config.route_kind),
            matrix,
            Algorithm::Exact,
        );
        result.proven_optimal = proven;
        result.cancelled = !proven && params.is_cancelled();
        result.iterations = Some(solution.explored as usize);
        result.elapsed = started.elapsed();
        log::info!(
            "exact solve finished: cost {:.3}, {:?} in {:?}",
            result.total_cost,
            solution.status,
            result.elapsed
        );
        Ok(result)
    }
}
