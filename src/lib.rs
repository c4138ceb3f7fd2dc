//! Route optimization over 3D waypoints.
//!
//! Given a set of waypoints, finds a short order in which to visit them all
//! once, as an open path or a closed tour. Solvers:
//!
//! - **Nearest Neighbor**: greedy O(n²) construction; fast, deterministic,
//!   and the usual seed for refinement.
//! - **Simulated Annealing (SA)**: swap and segment-reversal moves with
//!   Metropolis acceptance and pluggable cooling schedules.
//! - **Exact**: formulates a single-vehicle routing model and delegates the
//!   search to a [`RoutingEngine`](engine::RoutingEngine); the bundled
//!   engine combines Held-Karp and branch and bound.
//!
//! # Architecture
//!
//! Every solver consumes one immutable [`CostMatrix`](distance::CostMatrix)
//! built from the waypoints (Euclidean or planar distance, optionally
//! weighted per edge). The [`Optimizer`] validates input, builds the matrix
//! once and dispatches by [`Algorithm`]. Results are plain owned data.
//!
//! # Example
//!
//! ```
//! use u_waypath::{Algorithm, OptimizeConfig, Optimizer, RouteKind, Waypoint};
//!
//! let wps = Waypoint::from_points(&[
//!     (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (10.0, 10.0, 0.0), (0.0, 10.0, 0.0),
//! ]);
//! let config = OptimizeConfig::default().with_route_kind(RouteKind::Open);
//! let result = Optimizer::new()
//!     .optimize(&wps, Algorithm::NearestNeighbor, &config)
//!     .unwrap();
//! assert_eq!(result.route.order(), &[0, 1, 2, 3]);
//! assert!((result.total_cost - 30.0).abs() < 1e-9);
//! ```

pub mod distance;
pub mod engine;
pub mod error;
pub mod exact;
pub mod nearest_neighbor;
pub mod optimizer;
pub mod result;
pub mod route;
pub mod sa;
pub mod waypoint;

pub use error::{Error, OptimizeError, Result};
pub use nearest_neighbor::NearestNeighbor;
pub use optimizer::{Algorithm, OptimizeConfig, Optimizer};
pub use result::{AnnealingStats, SolveResult};
pub use route::{Route, RouteKind};
pub use waypoint::{validate_waypoints, Point3, Waypoint};
