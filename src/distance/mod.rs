//! Distance model.
//!
//! Turns a waypoint set into the dense [`CostMatrix`] consumed by every
//! solver. The base cost is the Euclidean distance in 3D (or in the XY
//! plane with [`Metric::Planar`]); an optional [`EdgeWeight`] adjusts each
//! ordered pair multiplicatively or additively, e.g. to penalize climbing
//! ([`ClimbPenalty`]) or to route around obstacles ([`SphereObstacle`]).

mod matrix;
mod weight;

pub use matrix::{compute_cost_matrix, CostMatrix, Metric};
pub use weight::{Adjustment, ClimbPenalty, EdgeWeight, SphereObstacle};
