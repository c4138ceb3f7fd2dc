//! Annealing execution loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::{AnnealingConfig, CoolingSchedule, InitialRoute};
use super::moves::{EdgeCosts, Move};
use super::state::AnnealingState;
use crate::distance::CostMatrix;
use crate::error::{Error, Result};
use crate::nearest_neighbor::NearestNeighbor;
use crate::optimizer::Algorithm;
use crate::result::{AnnealingStats, SolveResult};
use crate::route::{Route, RouteKind};

/// Simulated annealing over waypoint routes.
///
/// Proposes swap or segment-reversal moves between two random positions,
/// evaluates them from the affected edges only, and accepts them with the
/// Metropolis criterion. The best route seen is returned, not the final
/// current one.
pub struct AnnealingSolver;

impl AnnealingSolver {
    /// Runs annealing on `matrix`, optionally refining `seed_route`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for an invalid configuration, a start index
    /// out of range, or a seed route that is not a permutation of the
    /// matrix's waypoints.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_waypath::distance::compute_cost_matrix;
    /// use u_waypath::sa::{AnnealingConfig, AnnealingSolver};
    /// use u_waypath::Waypoint;
    ///
    /// let wps = Waypoint::from_points(&[
    ///     (0.0, 0.0, 0.0), (10.0, 10.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0, 0.0),
    /// ]);
    /// let m = compute_cost_matrix(&wps, None).unwrap();
    /// let config = AnnealingConfig::default().with_seed(1);
    /// let result = AnnealingSolver::solve(&m, &config, None).unwrap();
    /// assert!((result.total_cost - 40.0).abs() < 1e-9);
    /// ```
    pub fn solve(
        matrix: &CostMatrix,
        config: &AnnealingConfig,
        seed_route: Option<&Route>,
    ) -> Result<SolveResult> {
        Self::solve_with_cancel(matrix, config, seed_route, None)
    }

    /// Runs annealing with an optional cancellation token.
    ///
    /// The token is checked at every iteration. A cancelled run returns the
    /// best route found so far with `cancelled` set.
    pub fn solve_with_cancel(
        matrix: &CostMatrix,
        config: &AnnealingConfig,
        seed_route: Option<&Route>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolveResult> {
        let started = Instant::now();
        config.validate()?;
        let n = matrix.size();
        if let Some(start) = config.start {
            if start >= n {
                return Err(Error::invalid(format!(
                    "start index {start} out of range for {n} waypoints"
                )));
            }
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let costs = EdgeCosts::new(matrix, config.route_kind);
        let order = initial_order(matrix, config, seed_route)?;
        let initial_cost = costs.route_cost(&order);
        let start_cost = matrix.route_cost(&order, config.route_kind);
        let initial_temperature = config.resolve_initial_temperature(matrix);
        let mut state = AnnealingState::new(order, initial_cost, initial_temperature);

        // Closed tours and fixed starts keep position 0 in place.
        let lo = if config.start.is_some() || config.route_kind == RouteKind::Closed {
            1
        } else {
            0
        };
        let movable = n.saturating_sub(lo) >= 2;

        log::debug!(
            "annealing {n} waypoints: T0 {initial_temperature:.4}, seed {seed}, \
             initial cost {initial_cost:.3}"
        );

        let linear_max_steps = compute_linear_steps(config);
        let mut convergence = vec![state.best_cost];
        let mut cancelled = false;
        let mut step = 0usize;

        'cooling: while movable && state.temperature > config.min_temperature {
            let inner_iters = match config.cooling {
                CoolingSchedule::LundyMees { .. } => 1,
                _ => config.iterations_per_temperature,
            };

            for _ in 0..inner_iters {
                if config.max_iterations > 0 && state.iteration >= config.max_iterations {
                    break 'cooling;
                }
                if let Some(ref flag) = cancel {
                    if flag.load(Ordering::Relaxed) {
                        cancelled = true;
                        break 'cooling;
                    }
                }

                let mv = Move::random(config.moves, lo, n, &mut rng);
                let delta = costs.delta(&state.order, mv);

                // Metropolis acceptance criterion
                let accept = if delta <= 0.0 {
                    true
                } else {
                    let probability = (-delta / state.temperature).exp();
                    rng.random_range(0.0..1.0) < probability
                };

                if accept {
                    mv.apply(&mut state.order);
                    state.accept(delta);
                }

                state.iteration += 1;
                if state.iteration.is_multiple_of(config.trace_interval) {
                    convergence.push(state.best_cost);
                }
            }

            state.temperature = cool(
                state.temperature,
                config,
                initial_temperature,
                step,
                linear_max_steps,
            );
            step += 1;
        }

        if convergence
            .last()
            .is_none_or(|&last| (last - state.best_cost).abs() > 1e-15)
        {
            convergence.push(state.best_cost);
        }

        let route = Route::new(state.best_order, config.route_kind);
        let mut result = SolveResult::new(route, matrix, Algorithm::SimulatedAnnealing);
        result.iterations = Some(state.iteration);
        result.convergence = convergence;
        result.cancelled = cancelled;
        result.seed = Some(seed);
        result.initial_cost = Some(start_cost);
        result.annealing = Some(AnnealingStats {
            initial_temperature,
            final_temperature: state.temperature,
            accepted_moves: state.accepted_moves,
            improving_moves: state.improving_moves,
        });
        result.elapsed = started.elapsed();

        log::debug!(
            "annealing finished after {} iterations: best {:.3}{}",
            state.iteration,
            result.total_cost,
            if cancelled { " (cancelled)" } else { "" }
        );
        Ok(result)
    }
}

/// Builds the starting visit order: seed route, else the configured
/// construction.
fn initial_order(
    matrix: &CostMatrix,
    config: &AnnealingConfig,
    seed_route: Option<&Route>,
) -> Result<Vec<usize>> {
    let n = matrix.size();
    let mut order = match seed_route {
        Some(route) => {
            route.validate(n)?;
            route.order().to_vec()
        }
        None => match config.initial_route {
            InitialRoute::NearestNeighbor => {
                NearestNeighbor::solve(matrix, config.start.unwrap_or(0), RouteKind::Open)?
                    .into_order()
            }
            InitialRoute::Identity => (0..n).collect(),
        },
    };

    if let Some(start) = config.start {
        if let Some(pos) = order.iter().position(|&i| i == start).filter(|&p| p != 0) {
            match (config.route_kind, seed_route) {
                (RouteKind::Closed, _) => order.rotate_left(pos),
                (RouteKind::Open, None) => {
                    order.remove(pos);
                    order.insert(0, start);
                }
                (RouteKind::Open, Some(_)) => {
                    return Err(Error::invalid(format!(
                        "seed route starts at {} but the start is fixed at {start}",
                        order[0]
                    )));
                }
            }
        }
    }
    Ok(order)
}

/// Apply the cooling schedule to compute the next temperature.
fn cool(
    temperature: f64,
    config: &AnnealingConfig,
    initial_temperature: f64,
    step: usize,
    linear_max_steps: usize,
) -> f64 {
    match config.cooling {
        CoolingSchedule::Geometric { alpha } => temperature * alpha,

        CoolingSchedule::Linear => {
            if linear_max_steps == 0 {
                config.min_temperature
            } else {
                let t = initial_temperature
                    - (step + 1) as f64 * (initial_temperature - config.min_temperature)
                        / linear_max_steps as f64;
                t.max(config.min_temperature)
            }
        }

        CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
    }
}

/// Estimate the number of temperature steps for linear cooling.
fn compute_linear_steps(config: &AnnealingConfig) -> usize {
    match config.cooling {
        CoolingSchedule::Linear => {
            if config.max_iterations > 0 {
                config.max_iterations / config.iterations_per_temperature
            } else {
                1000
            }
        }
        _ => 0,
    }
}
