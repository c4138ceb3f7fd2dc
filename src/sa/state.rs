//! Mutable state of a single annealing run.

/// Search state owned by one run of the annealing solver.
///
/// Created when a solve starts and dropped when it returns; never shared
/// between runs or threads.
#[derive(Debug, Clone)]
pub struct AnnealingState {
    /// Current visit order (no closing repeat).
    pub order: Vec<usize>,
    /// Search cost of `order` (blocked edges priced at the penalty).
    pub cost: f64,
    /// Best visit order seen so far.
    pub best_order: Vec<usize>,
    /// Search cost of `best_order`.
    pub best_cost: f64,
    /// Current temperature.
    pub temperature: f64,
    /// Iterations performed.
    pub iteration: usize,
    /// Accepted moves, including improvements.
    pub accepted_moves: usize,
    /// Strictly improving moves.
    pub improving_moves: usize,
}

impl AnnealingState {
    pub fn new(order: Vec<usize>, cost: f64, temperature: f64) -> Self {
        Self {
            best_order: order.clone(),
            best_cost: cost,
            order,
            cost,
            temperature,
            iteration: 0,
            accepted_moves: 0,
            improving_moves: 0,
        }
    }

    /// Commits an accepted move's cost change and records a new best.
    ///
    /// Returns `true` when the current order became the new best.
    pub fn accept(&mut self, delta: f64) -> bool {
        self.cost += delta;
        self.accepted_moves += 1;
        if delta < 0.0 {
            self.improving_moves += 1;
        }
        if self.cost < self.best_cost {
            self.best_cost = self.cost;
            self.best_order.clone_from(&self.order);
            true
        } else {
            false
        }
    }
}
