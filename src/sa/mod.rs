//! Simulated Annealing (SA) over waypoint routes.
//!
//! A single-solution trajectory metaheuristic inspired by the physical
//! annealing process. Worsening moves are accepted with a probability that
//! decreases as the temperature cools, which lets the search leave local
//! optima. Moves are pairwise swaps or segment reversals whose cost change
//! is computed from the affected edges only.
//!
//! Every run owns its random generator, seeded from the configuration, so a
//! fixed seed reproduces a run exactly.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Cerny (1985), "Thermodynamical Approach to the Travelling Salesman Problem"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"

mod config;
mod moves;
mod runner;
mod state;

pub use config::{AnnealingConfig, CoolingSchedule, InitialRoute, MoveStrategy, TEMPERATURE_SCALE};
pub use runner::AnnealingSolver;
pub use state::AnnealingState;
