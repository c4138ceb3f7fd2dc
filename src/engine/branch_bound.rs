//! In-process exact routing engine.
//!
//! # Algorithm
//!
//! - Up to `dp_limit` nodes: Held-Karp dynamic programming over subsets,
//!   O(2ⁿ·n²) time. Always proves optimality when it completes.
//! - Larger models: a path-cheapest-arc first tour, then depth-first
//!   branch and bound. Children are expanded cheapest arc first; a partial
//!   tour is pruned when its cost plus the cheapest outgoing arc of every
//!   node still to leave cannot beat the incumbent.
//!
//! The deadline and the cancel flag are polled every [`CHECK_INTERVAL`]
//! search nodes. An interrupted search returns its incumbent.
//!
//! # References
//!
//! - Held & Karp (1962), "A Dynamic Programming Approach to Sequencing Problems"
//! - Little, Murty, Sweeney & Karel (1963), "An Algorithm for the Traveling
//!   Salesman Problem"

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::model::RoutingModel;
use super::solver::{
    EngineError, EngineSolution, EngineStatus, FirstSolutionStrategy, RoutingEngine,
    SearchParameters,
};

/// Search nodes between two deadline/cancellation checks.
pub const CHECK_INTERVAL: u64 = 1024;

/// Largest model solved by dynamic programming, whatever `dp_limit` says.
const MAX_DP_NODES: usize = 18;

/// Exact routing engine combining Held-Karp and branch and bound.
#[derive(Debug, Clone)]
pub struct BranchAndBoundEngine {
    /// Models with at most this many nodes are solved by Held-Karp.
    pub dp_limit: usize,
    /// Models with more nodes are refused.
    pub max_nodes: usize,
}

impl Default for BranchAndBoundEngine {
    fn default() -> Self {
        Self {
            dp_limit: 13,
            max_nodes: 5000,
        }
    }
}

impl BranchAndBoundEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dp_limit(mut self, n: usize) -> Self {
        self.dp_limit = n;
        self
    }

    pub fn with_max_nodes(mut self, n: usize) -> Self {
        self.max_nodes = n;
        self
    }
}

impl RoutingEngine for BranchAndBoundEngine {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn solve(
        &self,
        model: &RoutingModel,
        params: &SearchParameters,
    ) -> Result<EngineSolution, EngineError> {
        model.validate().map_err(EngineError::ModelInvalid)?;
        let n = model.num_nodes();
        if n > self.max_nodes {
            return Err(EngineError::Unavailable(format!(
                "{n} nodes exceed the engine limit of {}",
                self.max_nodes
            )));
        }

        let started = Instant::now();
        let budget = Budget {
            deadline: started.checked_add(params.time_limit),
            cancel: params.cancel.as_deref(),
        };

        let mut solution = if n == 1 {
            EngineSolution {
                status: EngineStatus::Optimal,
                tour: vec![model.depot()],
                objective: Some(0),
                ..EngineSolution::empty(EngineStatus::Optimal)
            }
        } else if n <= self.dp_limit.min(MAX_DP_NODES) {
            held_karp(model, &budget)
        } else {
            let incumbent = match params.first_solution {
                FirstSolutionStrategy::PathCheapestArc => path_cheapest_arc(model),
                FirstSolutionStrategy::None => None,
            };
            branch_and_bound(model, incumbent, &budget)
        };
        solution.wall_time = started.elapsed();

        log::debug!(
            "{}: {n} nodes, status {:?}, objective {:?}, {} explored in {:?}",
            self.name(),
            solution.status,
            solution.objective,
            solution.explored,
            solution.wall_time
        );
        Ok(solution)
    }
}

struct Budget<'a> {
    deadline: Option<Instant>,
    cancel: Option<&'a AtomicBool>,
}

impl Budget<'_> {
    fn exhausted(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Greedy tour: from the depot, always take the cheapest arc to an
/// unvisited node (lowest index on ties). `None` if it gets stuck.
fn path_cheapest_arc(model: &RoutingModel) -> Option<(i64, Vec<usize>)> {
    let n = model.num_nodes();
    let depot = model.depot();
    let mut visited = vec![false; n];
    visited[depot] = true;
    let mut tour = Vec::with_capacity(n);
    tour.push(depot);
    let mut current = depot;
    let mut cost = 0i64;

    while tour.len() < n {
        let (arc, next) = (0..n)
            .filter(|&j| !visited[j])
            .filter_map(|j| model.arc_cost(current, j).map(|c| (c, j)))
            .min()?;
        visited[next] = true;
        tour.push(next);
        cost = cost.saturating_add(arc);
        current = next;
    }
    let back = model.arc_cost(current, depot)?;
    Some((cost.saturating_add(back), tour))
}

fn finish(incumbent: Option<(i64, Vec<usize>)>, stopped: bool, explored: u64) -> EngineSolution {
    let status = match (&incumbent, stopped) {
        (Some(_), false) => EngineStatus::Optimal,
        (Some(_), true) => EngineStatus::Feasible,
        (None, false) => EngineStatus::Infeasible,
        (None, true) => EngineStatus::Timeout,
    };
    let mut solution = EngineSolution::empty(status);
    if let Some((cost, tour)) = incumbent {
        solution.objective = Some(cost);
        solution.tour = tour;
    }
    solution.explored = explored;
    solution
}

fn held_karp(model: &RoutingModel, budget: &Budget<'_>) -> EngineSolution {
    const INF: i64 = i64::MAX;
    const NO_PARENT: u8 = u8::MAX;

    let depot = model.depot();
    let others: Vec<usize> = (0..model.num_nodes()).filter(|&v| v != depot).collect();
    let m = others.len();
    let full = 1usize << m;

    // dp[mask * m + last]: cheapest path from the depot through `mask`
    // ending at others[last].
    let mut dp = vec![INF; full * m];
    let mut parent = vec![NO_PARENT; full * m];
    for (k, &v) in others.iter().enumerate() {
        if let Some(c) = model.arc_cost(depot, v) {
            dp[(1 << k) * m + k] = c;
        }
    }

    let mut explored = 0u64;
    for mask in 1..full {
        if explored % CHECK_INTERVAL == 0 && budget.exhausted() {
            log::debug!("held-karp interrupted after {explored} subsets");
            return finish(path_cheapest_arc(model), true, explored);
        }
        explored += 1;

        for last in 0..m {
            if mask & (1 << last) == 0 {
                continue;
            }
            let here = dp[mask * m + last];
            if here == INF {
                continue;
            }
            for next in 0..m {
                if mask & (1 << next) != 0 {
                    continue;
                }
                let Some(c) = model.arc_cost(others[last], others[next]) else {
                    continue;
                };
                let idx = (mask | (1 << next)) * m + next;
                let candidate = here.saturating_add(c);
                if candidate < dp[idx] {
                    dp[idx] = candidate;
                    parent[idx] = last as u8;
                }
            }
        }
    }

    let all = full - 1;
    let best = (0..m)
        .filter_map(|last| {
            let path = dp[all * m + last];
            if path == INF {
                return None;
            }
            let back = model.arc_cost(others[last], depot)?;
            Some((path.saturating_add(back), last))
        })
        .min();

    let Some((cost, mut last)) = best else {
        return finish(None, false, explored);
    };

    let mut mask = all;
    let mut reversed = Vec::with_capacity(m);
    loop {
        reversed.push(others[last]);
        let p = parent[mask * m + last];
        mask &= !(1 << last);
        if p == NO_PARENT || mask == 0 {
            break;
        }
        last = p as usize;
    }
    let mut tour = Vec::with_capacity(m + 1);
    tour.push(depot);
    tour.extend(reversed.into_iter().rev());

    finish(Some((cost, tour)), false, explored)
}

struct Search<'a, 'b> {
    model: &'a RoutingModel,
    budget: &'a Budget<'b>,
    /// Outgoing arcs per node, cheapest first.
    successors: Vec<Vec<(i64, usize)>>,
    min_out: Vec<i64>,
    visited: Vec<bool>,
    path: Vec<usize>,
    best: Option<(i64, Vec<usize>)>,
    explored: u64,
    stopped: bool,
}

impl Search<'_, '_> {
    fn best_cost(&self) -> i64 {
        self.best.as_ref().map_or(i64::MAX, |(c, _)| *c)
    }

    /// `rest`: sum of `min_out` over the nodes not yet on the path.
    fn dfs(&mut self, current: usize, cost: i64, rest: i64) {
        if self.stopped {
            return;
        }
        if self.explored % CHECK_INTERVAL == 0 && self.budget.exhausted() {
            self.stopped = true;
            return;
        }
        self.explored += 1;

        let n = self.model.num_nodes();
        let depot = self.model.depot();
        if self.path.len() == n {
            if let Some(back) = self.model.arc_cost(current, depot) {
                let total = cost.saturating_add(back);
                if total < self.best_cost() {
                    self.best = Some((total, self.path.clone()));
                }
            }
            return;
        }

        let bound = cost
            .saturating_add(self.min_out[current])
            .saturating_add(rest);
        if bound >= self.best_cost() {
            return;
        }

        for k in 0..self.successors[current].len() {
            let (arc, next) = self.successors[current][k];
            if self.visited[next] || next == depot {
                continue;
            }
            let next_cost = cost.saturating_add(arc);
            let next_rest = rest - self.min_out[next];
            if next_cost.saturating_add(self.min_out[next]).saturating_add(next_rest)
                >= self.best_cost()
            {
                continue;
            }

            self.visited[next] = true;
            self.path.push(next);
            self.dfs(next, next_cost, next_rest);
            self.path.pop();
            self.visited[next] = false;

            if self.stopped {
                return;
            }
        }
    }
}

fn branch_and_bound(
    model: &RoutingModel,
    incumbent: Option<(i64, Vec<usize>)>,
    budget: &Budget<'_>,
) -> EngineSolution {
    let n = model.num_nodes();
    let depot = model.depot();

    let successors: Vec<Vec<(i64, usize)>> = (0..n)
        .map(|from| {
            let mut arcs: Vec<(i64, usize)> = (0..n)
                .filter(|&to| to != from)
                .filter_map(|to| model.arc_cost(from, to).map(|c| (c, to)))
                .collect();
            arcs.sort_unstable();
            arcs
        })
        .collect();

    // A node without an outgoing or incoming arc can never be toured.
    let no_exit = successors.iter().any(|arcs| arcs.is_empty());
    let no_entry =
        (0..n).any(|to| (0..n).all(|from| from == to || model.arc_cost(from, to).is_none()));
    if no_exit || no_entry {
        return finish(None, false, 0);
    }

    let min_out: Vec<i64> = successors.iter().map(|arcs| arcs[0].0).collect();
    let rest: i64 = (0..n)
        .filter(|&v| v != depot)
        .map(|v| min_out[v])
        .fold(0i64, i64::saturating_add);

    let mut visited = vec![false; n];
    visited[depot] = true;
    let mut search = Search {
        model,
        budget,
        successors,
        min_out,
        visited,
        path: vec![depot],
        best: incumbent,
        explored: 0,
        stopped: false,
    };
    search.dfs(depot, 0, rest);

    finish(search.best, search.stopped, search.explored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    fn model_from(costs: &[Vec<i64>]) -> RoutingModel {
        let n = costs.len();
        let mut model = RoutingModel::new(n, 0);
        for (i, row) in costs.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                if i != j && c >= 0 {
                    model.set_arc_cost(i, j, Some(c));
                }
            }
        }
        model
    }

    /// Deterministic asymmetric instance.
    fn scrambled(n: usize) -> RoutingModel {
        let costs: Vec<Vec<i64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| ((i * 37 + j * 91 + i * j * 13) % 97 + 3) as i64)
                    .collect()
            })
            .collect();
        model_from(&costs)
    }

    fn square() -> RoutingModel {
        // Corners of a 10x10 square, scaled by 100 as integer costs.
        let d = 1414;
        model_from(&[
            vec![0, 1000, d, 1000],
            vec![1000, 0, 1000, d],
            vec![d, 1000, 0, 1000],
            vec![1000, d, 1000, 0],
        ])
    }

    #[test]
    fn test_square_optimal() {
        let engine = BranchAndBoundEngine::new();
        let sol = engine.solve(&square(), &SearchParameters::default()).unwrap();
        assert_eq!(sol.status, EngineStatus::Optimal);
        assert_eq!(sol.objective, Some(4000));
        assert_eq!(sol.tour[0], 0);
        assert_eq!(sol.tour.len(), 4);
    }

    #[test]
    fn test_branch_and_bound_matches_held_karp() {
        for n in [5, 7, 9] {
            let model = scrambled(n);
            let dp = BranchAndBoundEngine::new()
                .solve(&model, &SearchParameters::default())
                .unwrap();
            let bb = BranchAndBoundEngine::new()
                .with_dp_limit(0)
                .solve(&model, &SearchParameters::default())
                .unwrap();
            assert_eq!(dp.status, EngineStatus::Optimal);
            assert_eq!(bb.status, EngineStatus::Optimal);
            assert_eq!(dp.objective, bb.objective, "n = {n}");
            assert_eq!(model.tour_cost(&dp.tour), dp.objective);
            assert_eq!(model.tour_cost(&bb.tour), bb.objective);
        }
    }

    #[test]
    fn test_single_node() {
        let sol = BranchAndBoundEngine::new()
            .solve(&RoutingModel::new(1, 0), &SearchParameters::default())
            .unwrap();
        assert_eq!(sol.tour, vec![0]);
        assert_eq!(sol.objective, Some(0));
    }

    #[test]
    fn test_no_arcs_is_infeasible() {
        let model = RoutingModel::new(4, 0);
        for engine in [
            BranchAndBoundEngine::new(),
            BranchAndBoundEngine::new().with_dp_limit(0),
        ] {
            let sol = engine.solve(&model, &SearchParameters::default()).unwrap();
            assert_eq!(sol.status, EngineStatus::Infeasible);
            assert!(!sol.is_solution_found());
        }
    }

    #[test]
    fn test_forbidden_arcs_respected() {
        // Only 0 -> 1 -> 2 -> 0 is allowed.
        let model = model_from(&[vec![0, 5, -1], vec![-1, 0, 5], vec![5, -1, 0]]);
        let sol = BranchAndBoundEngine::new()
            .solve(&model, &SearchParameters::default())
            .unwrap();
        assert_eq!(sol.tour, vec![0, 1, 2]);
        assert_eq!(sol.objective, Some(15));
    }

    #[test]
    fn test_zero_time_limit_without_first_solution_times_out() {
        let params = SearchParameters::default()
            .with_time_limit(Duration::ZERO)
            .with_first_solution(FirstSolutionStrategy::None);
        let sol = BranchAndBoundEngine::new()
            .with_dp_limit(0)
            .solve(&scrambled(30), &params)
            .unwrap();
        assert_eq!(sol.status, EngineStatus::Timeout);
    }

    #[test]
    fn test_cancel_returns_first_solution() {
        let params = SearchParameters::default().with_cancel(Arc::new(AtomicBool::new(true)));
        let model = scrambled(30);
        let sol = BranchAndBoundEngine::new().solve(&model, &params).unwrap();
        assert_eq!(sol.status, EngineStatus::Feasible);
        assert_eq!(sol.tour.len(), 30);
        assert_eq!(model.tour_cost(&sol.tour), sol.objective);
    }

    #[test]
    fn test_model_too_large() {
        let engine = BranchAndBoundEngine::new().with_max_nodes(3);
        assert!(matches!(
            engine.solve(&scrambled(4), &SearchParameters::default()),
            Err(EngineError::Unavailable(_))
        ));
    }

    #[test]
    fn test_invalid_model() {
        let model = RoutingModel::new(3, 5);
        assert!(matches!(
            BranchAndBoundEngine::new().solve(&model, &SearchParameters::default()),
            Err(EngineError::ModelInvalid(_))
        ));
    }
}
