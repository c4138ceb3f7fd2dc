//! Nearest-neighbor construction heuristic.
//!
//! Starts from a given waypoint and repeatedly travels to the closest
//! unvisited one. O(n²) time, O(n) extra space. The route is always a valid
//! permutation but carries no optimality guarantee; it serves as a fast
//! standalone answer, a fallback, and a seed for annealing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::distance::CostMatrix;
use crate::error::{Error, Result};
use crate::optimizer::Algorithm;
use crate::result::SolveResult;
use crate::route::{Route, RouteKind};

/// Greedy nearest-neighbor solver.
pub struct NearestNeighbor;

impl NearestNeighbor {
    /// Builds a route starting at `start`.
    ///
    /// Ties are broken by the lowest waypoint index, so the result is
    /// deterministic. Blocked edges are taken only when no finite edge
    /// leads to an unvisited waypoint.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `start` is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_waypath::distance::compute_cost_matrix;
    /// use u_waypath::{NearestNeighbor, RouteKind, Waypoint};
    ///
    /// let wps = Waypoint::from_points(&[
    ///     (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (10.0, 10.0, 0.0), (0.0, 10.0, 0.0),
    /// ]);
    /// let m = compute_cost_matrix(&wps, None).unwrap();
    /// let route = NearestNeighbor::solve(&m, 0, RouteKind::Open).unwrap();
    /// assert_eq!(route.order(), &[0, 1, 2, 3]);
    /// assert!((route.cost(&m) - 30.0).abs() < 1e-9);
    /// ```
    pub fn solve(matrix: &CostMatrix, start: usize, kind: RouteKind) -> Result<Route> {
        let (order, _) = build(matrix, start, None)?;
        Ok(Route::new(order, kind))
    }

    /// Runs the heuristic and wraps the route in a [`SolveResult`].
    ///
    /// The cancel flag is checked before each step. On cancellation the
    /// unvisited waypoints are appended in index order, so the route stays
    /// a valid permutation.
    pub fn solve_with_cancel(
        matrix: &CostMatrix,
        start: usize,
        kind: RouteKind,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolveResult> {
        let started = Instant::now();
        let (order, cancelled) = build(matrix, start, cancel.as_deref())?;
        let route = Route::new(order, kind);
        let mut result = SolveResult::new(route, matrix, Algorithm::NearestNeighbor);
        result.cancelled = cancelled;
        result.elapsed = started.elapsed();
        log::debug!(
            "nearest neighbor from {start}: cost {:.3} over {} waypoints{}",
            result.total_cost,
            matrix.size(),
            if cancelled { " (cancelled)" } else { "" }
        );
        Ok(result)
    }
}

fn build(
    matrix: &CostMatrix,
    start: usize,
    cancel: Option<&AtomicBool>,
) -> Result<(Vec<usize>, bool)> {
    let n = matrix.size();
    if start >= n {
        return Err(Error::invalid(format!(
            "start index {start} out of range for {n} waypoints"
        )));
    }

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    visited[start] = true;
    order.push(start);
    let mut current = start;

    while order.len() < n {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            order.extend((0..n).filter(|&i| !visited[i]));
            return Ok((order, true));
        }

        let mut nearest: Option<(usize, f64)> = None;
        for (j, seen) in visited.iter().enumerate() {
            if *seen {
                continue;
            }
            let cost = matrix.get(current, j);
            // Strict comparison keeps the lowest index on ties.
            match nearest {
                Some((_, best)) if cost >= best => {}
                _ => nearest = Some((j, cost)),
            }
        }

        let Some((next, _)) = nearest else {
            break;
        };
        visited[next] = true;
        order.push(next);
        current = next;
    }

    Ok((order, false))
}
