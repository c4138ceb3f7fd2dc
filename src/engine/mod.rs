//! Combinatorial routing engines.
//!
//! An engine searches a [`RoutingModel`]: a single vehicle leaves the
//! depot, visits every node exactly once and returns, over integer arc
//! costs. Forbidden arcs have no cost.
//!
//! # Key Components
//!
//! - **Model**: [`RoutingModel`]: nodes, depot, arc costs
//! - **Engine**: [`RoutingEngine`] trait: interface for engine implementations
//! - **Parameters**: [`SearchParameters`]: time limit, first solution, cancellation
//! - **Default engine**: [`BranchAndBoundEngine`]: Held-Karp and branch and bound
//!
//! # Design
//!
//! This module knows nothing about waypoints or floating-point costs. The
//! [`exact`](crate::exact) adapter translates a cost matrix into a model
//! and the engine's tour back into a route, so a native solver (OR-Tools,
//! LKH) can be plugged in by implementing [`RoutingEngine`] alone.

mod branch_bound;
mod model;
mod solver;

pub use branch_bound::{BranchAndBoundEngine, CHECK_INTERVAL};
pub use model::RoutingModel;
pub use solver::{
    EngineError, EngineSolution, EngineStatus, FirstSolutionStrategy, RoutingEngine,
    SearchParameters,
};
