//! Uniform entry point over all route solvers.
//!
//! [`Optimizer`] validates a waypoint set once, builds its cost matrix once,
//! dispatches to the selected [`Algorithm`] and returns a normalized
//! [`SolveResult`]: total elapsed time including the matrix build, and the
//! cost of the submitted order as a baseline.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::distance::{CostMatrix, EdgeWeight, Metric};
use crate::engine::{BranchAndBoundEngine, RoutingEngine};
use crate::error::{Error, OptimizeError, Result};
use crate::exact::{ExactConfig, ExactSolver};
use crate::nearest_neighbor::NearestNeighbor;
use crate::result::SolveResult;
use crate::route::RouteKind;
use crate::sa::{AnnealingConfig, AnnealingSolver, InitialRoute};
use crate::waypoint::{validate_waypoints, Waypoint, DEFAULT_DUPLICATE_EPSILON};

/// Route optimization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Algorithm {
    /// Greedy nearest-neighbor construction.
    NearestNeighbor,
    /// Simulated annealing from the configured initial route.
    SimulatedAnnealing,
    /// Exact search through the optimizer's routing engine.
    Exact,
    /// Nearest neighbor, then annealing seeded with its route.
    SimulatedAnnealingSeededByNearestNeighbor,
}

impl Algorithm {
    /// Every algorithm, fastest first.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::NearestNeighbor,
        Algorithm::SimulatedAnnealing,
        Algorithm::SimulatedAnnealingSeededByNearestNeighbor,
        Algorithm::Exact,
    ];

    /// Short name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::NearestNeighbor => "nearest-neighbor",
            Algorithm::SimulatedAnnealing => "simulated-annealing",
            Algorithm::Exact => "exact",
            Algorithm::SimulatedAnnealingSeededByNearestNeighbor => "nn+simulated-annealing",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration shared by every algorithm of an optimization.
///
/// `route_kind` and `start` override the same fields of the nested solver
/// configurations, so one setting applies to whichever algorithm runs.
///
/// # Examples
///
/// ```
/// use u_waypath::{OptimizeConfig, RouteKind};
///
/// let config = OptimizeConfig::default()
///     .with_route_kind(RouteKind::Open)
///     .with_start(2)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.annealing.seed, Some(42));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizeConfig {
    /// Open path or closed tour. Default: closed.
    pub route_kind: RouteKind,
    /// First waypoint. `None` starts nearest neighbor and closed tours at
    /// waypoint 0, and leaves the start of exact open paths free.
    pub start: Option<usize>,
    /// Base distance.
    pub metric: Metric,
    /// Waypoints closer than this are rejected as duplicates.
    pub duplicate_epsilon: f64,
    /// Annealing parameters. Starts from the submitted order by default.
    pub annealing: AnnealingConfig,
    /// Exact solver parameters.
    pub exact: ExactConfig,
    /// Cooperative cancellation flag, checked by every solver.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            route_kind: RouteKind::default(),
            start: None,
            metric: Metric::default(),
            duplicate_epsilon: DEFAULT_DUPLICATE_EPSILON,
            annealing: AnnealingConfig::default().with_initial_route(InitialRoute::Identity),
            exact: ExactConfig::default(),
            cancel: None,
        }
    }
}

impl OptimizeConfig {
    pub fn with_route_kind(mut self, kind: RouteKind) -> Self {
        self.route_kind = kind;
        self
    }

    pub fn with_start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_duplicate_epsilon(mut self, epsilon: f64) -> Self {
        self.duplicate_epsilon = epsilon;
        self
    }

    pub fn with_annealing(mut self, annealing: AnnealingConfig) -> Self {
        self.annealing = annealing;
        self
    }

    pub fn with_exact(mut self, exact: ExactConfig) -> Self {
        self.exact = exact;
        self
    }

    /// Sets the annealing seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.annealing.seed = Some(seed);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validates the configuration and the nested solver configurations.
    pub fn validate(&self) -> Result<()> {
        if !self.duplicate_epsilon.is_finite() || self.duplicate_epsilon < 0.0 {
            return Err(Error::invalid(format!(
                "duplicate_epsilon must be finite and non-negative, got {}",
                self.duplicate_epsilon
            )));
        }
        self.annealing.validate()?;
        self.exact.validate()
    }

    fn annealing_config(&self) -> AnnealingConfig {
        AnnealingConfig {
            route_kind: self.route_kind,
            start: self.start,
            ..self.annealing.clone()
        }
    }

    fn exact_config(&self) -> ExactConfig {
        ExactConfig {
            route_kind: self.route_kind,
            start: self.start,
            ..self.exact.clone()
        }
    }
}

/// Route optimizer dispatching to the selected algorithm.
///
/// Owns the routing engine used by [`Algorithm::Exact`].
///
/// # Examples
///
/// ```
/// use u_waypath::{Algorithm, OptimizeConfig, Optimizer, Waypoint};
///
/// let wps = Waypoint::from_points(&[
///     (0.0, 0.0, 0.0), (10.0, 10.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0, 0.0),
/// ]);
/// let optimizer = Optimizer::new();
/// let result = optimizer
///     .optimize(&wps, Algorithm::Exact, &OptimizeConfig::default())
///     .unwrap();
/// assert!((result.total_cost - 40.0).abs() < 1e-9);
/// assert!(result.improvement().unwrap() > 0.0);
/// ```
pub struct Optimizer {
    engine: Box<dyn RoutingEngine>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    /// Creates an optimizer using [`BranchAndBoundEngine`] for exact solves.
    pub fn new() -> Self {
        Self {
            engine: Box::new(BranchAndBoundEngine::default()),
        }
    }

    /// Replaces the routing engine.
    pub fn with_engine(mut self, engine: impl RoutingEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Name of the routing engine in use.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Optimizes the visiting order of `waypoints`.
    ///
    /// # Errors
    ///
    /// Any solver error, unchanged, tagged with `algorithm`. Waypoint sets
    /// with fewer than 2 points, non-finite coordinates or duplicates are
    /// rejected as [`Error::InvalidInput`] before any solver runs.
    pub fn optimize(
        &self,
        waypoints: &[Waypoint],
        algorithm: Algorithm,
        config: &OptimizeConfig,
    ) -> std::result::Result<SolveResult, OptimizeError> {
        self.optimize_inner(waypoints, None, algorithm, config)
    }

    /// Like [`optimize`](Self::optimize), with every edge's base distance
    /// passed through `weight`.
    pub fn optimize_weighted(
        &self,
        waypoints: &[Waypoint],
        weight: &dyn EdgeWeight,
        algorithm: Algorithm,
        config: &OptimizeConfig,
    ) -> std::result::Result<SolveResult, OptimizeError> {
        self.optimize_inner(waypoints, Some(weight), algorithm, config)
    }

    /// Runs `algorithm` on a caller-supplied matrix.
    pub fn optimize_matrix(
        &self,
        matrix: &CostMatrix,
        algorithm: Algorithm,
        config: &OptimizeConfig,
    ) -> std::result::Result<SolveResult, OptimizeError> {
        let started = Instant::now();
        config
            .validate()
            .map_err(|e| OptimizeError::new(algorithm, e))?;
        let mut result = self.dispatch(matrix, algorithm, config)?;
        result.elapsed = started.elapsed();
        Ok(result)
    }

    /// Runs several algorithms on one shared matrix.
    ///
    /// Results come back in the order of `algorithms`. With the `parallel`
    /// feature the runs execute concurrently on the rayon pool.
    pub fn compare(
        &self,
        waypoints: &[Waypoint],
        algorithms: &[Algorithm],
        config: &OptimizeConfig,
    ) -> Vec<std::result::Result<SolveResult, OptimizeError>> {
        let started = Instant::now();
        let matrix = match prepare(waypoints, None, config) {
            Ok(m) => m,
            Err(e) => {
                return algorithms
                    .iter()
                    .map(|&a| Err(OptimizeError::new(a, e.clone())))
                    .collect();
            }
        };
        let build_time = started.elapsed();
        log::info!(
            "comparing {} algorithms on {} waypoints",
            algorithms.len(),
            matrix.size()
        );

        let run = |&algorithm: &Algorithm| -> std::result::Result<SolveResult, OptimizeError> {
            let mut result = self.dispatch(&matrix, algorithm, config)?;
            result.elapsed += build_time;
            Ok(result)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            algorithms.par_iter().map(run).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            algorithms.iter().map(run).collect()
        }
    }

    fn optimize_inner(
        &self,
        waypoints: &[Waypoint],
        weight: Option<&dyn EdgeWeight>,
        algorithm: Algorithm,
        config: &OptimizeConfig,
    ) -> std::result::Result<SolveResult, OptimizeError> {
        let started = Instant::now();
        let matrix =
            prepare(waypoints, weight, config).map_err(|e| OptimizeError::new(algorithm, e))?;
        let mut result = self.dispatch(&matrix, algorithm, config)?;
        result.elapsed = started.elapsed();
        Ok(result)
    }

    fn dispatch(
        &self,
        matrix: &CostMatrix,
        algorithm: Algorithm,
        config: &OptimizeConfig,
    ) -> std::result::Result<SolveResult, OptimizeError> {
        log::info!("{algorithm}: solving {} waypoints", matrix.size());
        let mut result = self
            .run(matrix, algorithm, config)
            .map_err(|e| {
                log::warn!("{algorithm} failed: {e}");
                OptimizeError::new(algorithm, e)
            })?;

        let identity: Vec<usize> = (0..matrix.size()).collect();
        let baseline = matrix.route_cost(&identity, config.route_kind);
        result.baseline_cost = Some(baseline);
        result.algorithm = algorithm;
        log::info!(
            "{algorithm}: cost {:.3} (baseline {baseline:.3}){}",
            result.total_cost,
            if result.cancelled { ", cancelled" } else { "" }
        );
        Ok(result)
    }

    fn run(
        &self,
        matrix: &CostMatrix,
        algorithm: Algorithm,
        config: &OptimizeConfig,
    ) -> Result<SolveResult> {
        let cancel = config.cancel.clone();
        let start = config.start.unwrap_or(0);
        match algorithm {
            Algorithm::NearestNeighbor => {
                NearestNeighbor::solve_with_cancel(matrix, start, config.route_kind, cancel)
            }
            Algorithm::SimulatedAnnealing => {
                AnnealingSolver::solve_with_cancel(matrix, &config.annealing_config(), None, cancel)
            }
            Algorithm::SimulatedAnnealingSeededByNearestNeighbor => {
                let seed_route = NearestNeighbor::solve(matrix, start, config.route_kind)?;
                log::debug!(
                    "annealing from nearest-neighbor route of cost {:.3}",
                    seed_route.cost(matrix)
                );
                AnnealingSolver::solve_with_cancel(
                    matrix,
                    &config.annealing_config(),
                    Some(&seed_route),
                    cancel,
                )
            }
            Algorithm::Exact => ExactSolver::new(self.engine.as_ref()).solve_with_config(
                matrix,
                &config.exact_config(),
                cancel,
            ),
        }
    }
}

/// Validates the configuration and waypoints, then builds the matrix.
fn prepare(
    waypoints: &[Waypoint],
    weight: Option<&dyn EdgeWeight>,
    config: &OptimizeConfig,
) -> Result<CostMatrix> {
    config.validate()?;
    validate_waypoints(waypoints, config.duplicate_epsilon)?;
    CostMatrix::from_waypoints(waypoints, config.metric, weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{Adjustment, ClimbPenalty};
    use crate::engine::{EngineError, EngineSolution, RoutingModel, SearchParameters};
    use std::sync::atomic::Ordering;

    fn square() -> Vec<Waypoint> {
        Waypoint::from_points(&[
            (0.0, 0.0, 0.0),
            (10.0, 0.0, 0.0),
            (10.0, 10.0, 0.0),
            (0.0, 10.0, 0.0),
        ])
    }

    /// Square corners in crossing order: the identity tour is 48.28.
    fn crossed_square() -> Vec<Waypoint> {
        Waypoint::from_points(&[
            (0.0, 0.0, 0.0),
            (10.0, 10.0, 0.0),
            (10.0, 0.0, 0.0),
            (0.0, 10.0, 0.0),
        ])
    }

    struct OfflineEngine;

    impl RoutingEngine for OfflineEngine {
        fn name(&self) -> &str {
            "offline"
        }

        fn solve(
            &self,
            _model: &RoutingModel,
            _params: &SearchParameters,
        ) -> std::result::Result<EngineSolution, EngineError> {
            Err(EngineError::Unavailable("not installed".into()))
        }
    }

    #[test]
    fn test_every_algorithm_on_square() {
        let optimizer = Optimizer::new();
        let config = OptimizeConfig::default().with_seed(5);
        for algorithm in Algorithm::ALL {
            let result = optimizer.optimize(&square(), algorithm, &config).unwrap();
            assert_eq!(result.algorithm, algorithm);
            assert!(result.route.validate(4).is_ok());
            assert!(
                (result.total_cost - 40.0).abs() < 1e-9,
                "{algorithm}: {}",
                result.total_cost
            );
            assert!((result.baseline_cost.unwrap() - 40.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_nearest_neighbor_open_square() {
        let config = OptimizeConfig::default().with_route_kind(RouteKind::Open);
        let result = Optimizer::new()
            .optimize(&square(), Algorithm::NearestNeighbor, &config)
            .unwrap();
        assert_eq!(result.route.order(), &[0, 1, 2, 3]);
        assert!((result.total_cost - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_improvement_over_submitted_order() {
        let result = Optimizer::new()
            .optimize(&crossed_square(), Algorithm::Exact, &OptimizeConfig::default())
            .unwrap();
        let baseline = 20.0 + 2.0 * 200f64.sqrt();
        assert!((result.baseline_cost.unwrap() - baseline).abs() < 1e-9);
        assert!((result.improvement().unwrap() - (baseline - 40.0) / baseline).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_waypoints_rejected() {
        let wps = Waypoint::from_points(&[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0), (0.0, 0.0, 0.0)]);
        let err = Optimizer::new()
            .optimize(&wps, Algorithm::NearestNeighbor, &OptimizeConfig::default())
            .unwrap_err();
        assert_eq!(err.algorithm, Algorithm::NearestNeighbor);
        assert!(matches!(err.source, Error::InvalidInput(_)));
    }

    #[test]
    fn test_too_few_waypoints() {
        let wps = Waypoint::from_points(&[(0.0, 0.0, 0.0)]);
        let err = Optimizer::new()
            .optimize(&wps, Algorithm::Exact, &OptimizeConfig::default())
            .unwrap_err();
        assert!(matches!(err.source, Error::InvalidInput(_)));
    }

    #[test]
    fn test_engine_failure_is_tagged() {
        let optimizer = Optimizer::new().with_engine(OfflineEngine);
        assert_eq!(optimizer.engine_name(), "offline");
        let err = optimizer
            .optimize(&square(), Algorithm::Exact, &OptimizeConfig::default())
            .unwrap_err();
        assert_eq!(err.algorithm, Algorithm::Exact);
        assert!(matches!(err.source, Error::SolverUnavailable(_)));
        assert!(err.to_string().starts_with("exact failed"));
    }

    #[test]
    fn test_weighted_climb_penalty() {
        // Climbing 0 -> 1 is expensive, descending is free of penalty.
        let wps = Waypoint::from_points(&[(0.0, 0.0, 0.0), (0.0, 0.0, 10.0), (10.0, 0.0, 0.0)]);
        let weight = ClimbPenalty { per_unit: 5.0 };
        let config = OptimizeConfig::default().with_route_kind(RouteKind::Open).with_start(0);
        let result = Optimizer::new()
            .optimize_weighted(&wps, &weight, Algorithm::Exact, &config)
            .unwrap();
        assert_eq!(result.route.start(), Some(0));
        assert!(result.route.validate(3).is_ok());
    }

    #[test]
    fn test_weighted_closure() {
        let double = |_: &Waypoint, _: &Waypoint| Adjustment::Multiply(2.0);
        let result = Optimizer::new()
            .optimize_weighted(
                &square(),
                &double,
                Algorithm::NearestNeighbor,
                &OptimizeConfig::default(),
            )
            .unwrap();
        assert!((result.total_cost - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_optimize_matrix() {
        let m = CostMatrix::from_data(3, vec![0.0, 1.0, 5.0, 5.0, 0.0, 1.0, 1.0, 5.0, 0.0])
            .unwrap();
        let result = Optimizer::new()
            .optimize_matrix(&m, Algorithm::Exact, &OptimizeConfig::default())
            .unwrap();
        assert_eq!(result.route.indices(), &[0, 1, 2, 0]);
        assert!((result.total_cost - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_compare_shares_one_matrix() {
        let config = OptimizeConfig::default().with_seed(11);
        let results = Optimizer::new().compare(&crossed_square(), &Algorithm::ALL, &config);
        assert_eq!(results.len(), 4);
        for (result, algorithm) in results.iter().zip(Algorithm::ALL) {
            let result = result.as_ref().unwrap();
            assert_eq!(result.algorithm, algorithm);
            assert!(result.route.validate(4).is_ok());
        }
    }

    #[test]
    fn test_compare_propagates_input_errors() {
        let wps = Waypoint::from_points(&[(0.0, 0.0, 0.0)]);
        let results = Optimizer::new().compare(
            &wps,
            &[Algorithm::NearestNeighbor, Algorithm::Exact],
            &OptimizeConfig::default(),
        );
        assert_eq!(results[1].as_ref().unwrap_err().algorithm, Algorithm::Exact);
    }

    #[test]
    fn test_cancelled_annealing_is_not_an_error() {
        let wps: Vec<Waypoint> = (0..30)
            .map(|k| Waypoint::new(k, (k * 7 % 30) as f64, (k * 11 % 30) as f64, k as f64))
            .collect();
        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::Relaxed);
        let config = OptimizeConfig::default().with_cancel(cancel);
        let result = Optimizer::new()
            .optimize(&wps, Algorithm::SimulatedAnnealing, &config)
            .unwrap();
        assert!(result.cancelled);
        assert!(result.route.validate(30).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = OptimizeConfig::default().with_duplicate_epsilon(-1.0);
        let err = Optimizer::new()
            .optimize(&square(), Algorithm::NearestNeighbor, &config)
            .unwrap_err();
        assert!(matches!(err.source, Error::InvalidInput(_)));
    }

    #[test]
    fn test_algorithm_display() {
        assert_eq!(Algorithm::NearestNeighbor.to_string(), "nearest-neighbor");
        assert_eq!(Algorithm::Exact.to_string(), "exact");
    }
}
