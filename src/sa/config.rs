//! Annealing configuration and cooling schedules.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::distance::CostMatrix;
use crate::error::{Error, Result};
use crate::route::RouteKind;

/// Multiplier applied to the mean edge cost when no initial temperature
/// is configured.
pub const TEMPERATURE_SCALE: f64 = 10.0;

/// Cooling schedule for temperature reduction.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoolingSchedule {
    /// Geometric (exponential) cooling: `T_{k+1} = alpha * T_k`.
    Geometric {
        /// Cooling rate in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// Linear cooling: `T_k = T_0 - k * (T_0 - T_min) / max_steps`.
    Linear,

    /// Lundy-Mees cooling: `T_{k+1} = T_k / (1 + beta * T_k)`.
    ///
    /// One iteration per temperature step.
    LundyMees {
        /// Cooling parameter. Typically `(T_0 - T_min) / (max_iter * T_0 * T_min)`.
        beta: f64,
    },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.995 }
    }
}

/// Local move proposed at each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MoveStrategy {
    /// Exchange the waypoints at two positions.
    Swap,
    /// Reverse the segment between two positions (2-opt). Removes crossing
    /// edges under Euclidean-like costs.
    #[default]
    Reverse,
    /// Reverse with the given probability, swap otherwise.
    Mixed { reverse_probability: f64 },
}

/// Where the search starts when no seed route is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitialRoute {
    /// Nearest-neighbor route from the start waypoint.
    #[default]
    NearestNeighbor,
    /// Waypoints in submitted order.
    Identity,
}

/// Configuration for the annealing solver.
///
/// # Examples
///
/// ```
/// use u_waypath::sa::{AnnealingConfig, CoolingSchedule, MoveStrategy};
///
/// let config = AnnealingConfig::default()
///     .with_initial_temperature(100.0)
///     .with_min_temperature(0.01)
///     .with_cooling_rate(0.98)
///     .with_moves(MoveStrategy::Mixed { reverse_probability: 0.8 })
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnnealingConfig {
    /// Starting temperature. `None` derives it from the matrix:
    /// `mean_edge_cost * TEMPERATURE_SCALE`.
    pub initial_temperature: Option<f64>,

    /// The run stops once the temperature is at or below this value
    /// (inclusive), so a schedule landing exactly on it ends there.
    pub min_temperature: f64,

    /// Cooling schedule.
    pub cooling: CoolingSchedule,

    /// Iterations between two cooling steps.
    ///
    /// For `LundyMees`, this is ignored (1 iteration per temperature).
    pub iterations_per_temperature: usize,

    /// Maximum total iterations (hard budget). 0 = no limit.
    pub max_iterations: usize,

    /// Move proposal strategy.
    pub moves: MoveStrategy,

    /// Sample the best cost every this many iterations.
    pub trace_interval: usize,

    /// Starting route when no seed route is given.
    pub initial_route: InitialRoute,

    /// Open path or closed tour.
    pub route_kind: RouteKind,

    /// Waypoint that must stay first. Closed tours always keep their first
    /// waypoint in place.
    pub start: Option<usize>,

    /// Random seed for reproducibility. `None` draws a fresh one, which is
    /// reported in the result.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: None,
            min_temperature: 1e-3,
            cooling: CoolingSchedule::default(),
            iterations_per_temperature: 1,
            max_iterations: 100_000,
            moves: MoveStrategy::default(),
            trace_interval: 100,
            initial_route: InitialRoute::default(),
            route_kind: RouteKind::default(),
            start: None,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = Some(t);
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    /// Shorthand for geometric cooling with the given rate.
    pub fn with_cooling_rate(mut self, alpha: f64) -> Self {
        self.cooling = CoolingSchedule::Geometric { alpha };
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_moves(mut self, moves: MoveStrategy) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_trace_interval(mut self, n: usize) -> Self {
        self.trace_interval = n;
        self
    }

    pub fn with_initial_route(mut self, initial: InitialRoute) -> Self {
        self.initial_route = initial;
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

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.initial_temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err(Error::invalid(format!(
                    "initial_temperature must be positive, got {t}"
                )));
            }
            if self.min_temperature >= t {
                return Err(Error::invalid(
                    "min_temperature must be less than initial_temperature",
                ));
            }
        }
        if !self.min_temperature.is_finite() || self.min_temperature <= 0.0 {
            return Err(Error::invalid(format!(
                "min_temperature must be positive, got {}",
                self.min_temperature
            )));
        }
        match self.cooling {
            CoolingSchedule::Geometric { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return Err(Error::invalid(format!(
                        "cooling rate must be in (0, 1), got {alpha}"
                    )));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if !(beta > 0.0 && beta.is_finite()) {
                    return Err(Error::invalid(format!(
                        "lundy-mees beta must be positive, got {beta}"
                    )));
                }
            }
            CoolingSchedule::Linear => {}
        }
        if self.iterations_per_temperature == 0 {
            return Err(Error::invalid("iterations_per_temperature must be at least 1"));
        }
        if self.trace_interval == 0 {
            return Err(Error::invalid("trace_interval must be at least 1"));
        }
        if let MoveStrategy::Mixed {
            reverse_probability,
        } = self.moves
        {
            if !(0.0..=1.0).contains(&reverse_probability) {
                return Err(Error::invalid(format!(
                    "reverse_probability must be in [0, 1], got {reverse_probability}"
                )));
            }
        }
        Ok(())
    }

    /// The starting temperature for a run over `matrix`.
    ///
    /// A derived temperature never falls below `min_temperature *
    /// TEMPERATURE_SCALE`, so the run always gets some iterations.
    pub fn resolve_initial_temperature(&self, matrix: &CostMatrix) -> f64 {
        match self.initial_temperature {
            Some(t) => t,
            None => {
                let derived = matrix.mean_edge_cost() * TEMPERATURE_SCALE;
                derived.max(self.min_temperature * TEMPERATURE_SCALE)
            }
        }
    }
}
