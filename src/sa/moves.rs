//! Local moves over a visit order and their incremental cost deltas.

use rand::Rng;

use super::config::MoveStrategy;
use crate::distance::CostMatrix;
use crate::route::RouteKind;

/// A move over positions `i < j` of the visit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Move {
    Swap(usize, usize),
    Reverse(usize, usize),
}

impl Move {
    /// Picks two distinct positions uniformly in `lo..n` and a move kind.
    ///
    /// Requires `n - lo >= 2`.
    pub(crate) fn random<R: Rng>(strategy: MoveStrategy, lo: usize, n: usize, rng: &mut R) -> Move {
        let a = rng.random_range(lo..n);
        let mut b = rng.random_range(lo..n - 1);
        if b >= a {
            b += 1;
        }
        let (i, j) = if a < b { (a, b) } else { (b, a) };

        let reverse = match strategy {
            MoveStrategy::Swap => false,
            MoveStrategy::Reverse => true,
            MoveStrategy::Mixed {
                reverse_probability,
            } => rng.random_range(0.0..1.0) < reverse_probability,
        };
        if reverse {
            Move::Reverse(i, j)
        } else {
            Move::Swap(i, j)
        }
    }

    pub(crate) fn apply(self, order: &mut [usize]) {
        match self {
            Move::Swap(i, j) => order.swap(i, j),
            Move::Reverse(i, j) => order[i..=j].reverse(),
        }
    }
}

/// Edge costs as seen by the search.
///
/// Blocked edges are priced with a finite big-M penalty so that deltas
/// stay finite; a route using one is always worse than any route avoiding
/// all of them.
pub(crate) struct EdgeCosts<'a> {
    matrix: &'a CostMatrix,
    penalty: f64,
    kind: RouteKind,
}

impl<'a> EdgeCosts<'a> {
    pub(crate) fn new(matrix: &'a CostMatrix, kind: RouteKind) -> Self {
        let n = matrix.size() as f64;
        let penalty = matrix.max_finite_cost().max(1.0) * (n + 1.0) * 10.0;
        Self {
            matrix,
            penalty,
            kind,
        }
    }

    #[inline]
    pub(crate) fn get(&self, from: usize, to: usize) -> f64 {
        let c = self.matrix.get(from, to);
        if c.is_finite() {
            c
        } else {
            self.penalty
        }
    }

    /// Cost of the whole visit order.
    pub(crate) fn route_cost(&self, order: &[usize]) -> f64 {
        let open: f64 = order.windows(2).map(|w| self.get(w[0], w[1])).sum();
        match (self.kind, order.first(), order.last()) {
            (RouteKind::Closed, Some(&first), Some(&last)) if order.len() > 1 => {
                open + self.get(last, first)
            }
            _ => open,
        }
    }

    /// Cost change of applying `mv` to `order`, from the affected edges only.
    pub(crate) fn delta(&self, order: &[usize], mv: Move) -> f64 {
        match mv {
            Move::Swap(i, j) => self.swap_delta(order, i, j),
            Move::Reverse(i, j) => self.reverse_delta(order, i, j),
        }
    }

    fn prev(&self, p: usize, n: usize) -> Option<usize> {
        match self.kind {
            _ if p > 0 => Some(p - 1),
            RouteKind::Closed if n > 1 => Some(n - 1),
            _ => None,
        }
    }

    fn next(&self, p: usize, n: usize) -> Option<usize> {
        match self.kind {
            _ if p + 1 < n => Some(p + 1),
            RouteKind::Closed if n > 1 => Some(0),
            _ => None,
        }
    }

    fn swap_delta(&self, order: &[usize], i: usize, j: usize) -> f64 {
        let n = order.len();
        // Position pairs (a, b) meaning an edge order[a] -> order[b].
        let mut edges: [(usize, usize); 4] = [(usize::MAX, usize::MAX); 4];
        let mut count = 0;
        let candidates = [
            self.prev(i, n).map(|p| (p, i)),
            self.next(i, n).map(|q| (i, q)),
            self.prev(j, n).map(|p| (p, j)),
            self.next(j, n).map(|q| (j, q)),
        ];
        for edge in candidates.into_iter().flatten() {
            if !edges[..count].contains(&edge) {
                edges[count] = edge;
                count += 1;
            }
        }

        let at = |p: usize| -> usize {
            if p == i {
                order[j]
            } else if p == j {
                order[i]
            } else {
                order[p]
            }
        };

        edges[..count]
            .iter()
            .map(|&(a, b)| self.get(at(a), at(b)) - self.get(order[a], order[b]))
            .sum()
    }

    fn reverse_delta(&self, order: &[usize], i: usize, j: usize) -> f64 {
        let n = order.len();
        let (first, last) = (order[i], order[j]);
        let mut delta = 0.0;

        // A segment spanning the whole closed tour has no outside edges.
        let spans_tour = self.kind == RouteKind::Closed && i == 0 && j == n - 1;
        if spans_tour {
            delta += self.get(first, last) - self.get(last, first);
        } else {
            if let Some(p) = self.prev(i, n) {
                let before = order[p];
                delta += self.get(before, last) - self.get(before, first);
            }
            if let Some(q) = self.next(j, n) {
                let after = order[q];
                delta += self.get(first, after) - self.get(last, after);
            }
        }

        if !self.matrix.is_symmetric() {
            for k in i..j {
                delta += self.get(order[k + 1], order[k]) - self.get(order[k], order[k + 1]);
            }
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn asymmetric() -> CostMatrix {
        let n = 6;
        let data = (0..n * n)
            .map(|k| {
                let (i, j) = (k / n, k % n);
                if i == j {
                    0.0
                } else {
                    ((i * 7 + j * 3) % 11 + 1) as f64
                }
            })
            .collect();
        CostMatrix::from_data(n, data).unwrap()
    }

    fn symmetric() -> CostMatrix {
        let n = 6;
        let data = (0..n * n)
            .map(|k| {
                let (i, j) = (k / n, k % n);
                if i == j {
                    0.0
                } else {
                    ((i + 1) * (j + 1) % 7 + 1) as f64
                }
            })
            .collect();
        CostMatrix::from_data(n, data).unwrap()
    }

    fn check_all_moves(matrix: &CostMatrix, kind: RouteKind) {
        let costs = EdgeCosts::new(matrix, kind);
        let order = vec![3, 0, 5, 1, 4, 2];
        let base = costs.route_cost(&order);
        for i in 0..order.len() {
            for j in (i + 1)..order.len() {
                for mv in [Move::Swap(i, j), Move::Reverse(i, j)] {
                    let mut moved = order.clone();
                    mv.apply(&mut moved);
                    let expected = costs.route_cost(&moved) - base;
                    let delta = costs.delta(&order, mv);
                    assert!(
                        (delta - expected).abs() < 1e-9,
                        "{kind:?} {mv:?}: delta {delta}, recomputed {expected}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_delta_matches_recompute_symmetric() {
        check_all_moves(&symmetric(), RouteKind::Open);
        check_all_moves(&symmetric(), RouteKind::Closed);
    }

    #[test]
    fn test_delta_matches_recompute_asymmetric() {
        check_all_moves(&asymmetric(), RouteKind::Open);
        check_all_moves(&asymmetric(), RouteKind::Closed);
    }

    #[test]
    fn test_blocked_edges_get_finite_penalty() {
        let inf = f64::INFINITY;
        let m = CostMatrix::from_data(3, vec![0.0, 1.0, inf, 1.0, 0.0, 2.0, inf, 2.0, 0.0])
            .unwrap();
        let costs = EdgeCosts::new(&m, RouteKind::Closed);
        assert!(costs.get(0, 2).is_finite());
        assert!(costs.get(0, 2) > 3.0);
        assert!(costs.delta(&[0, 1, 2], Move::Swap(1, 2)).is_finite());
    }

    #[test]
    fn test_random_positions_are_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            match Move::random(MoveStrategy::Mixed { reverse_probability: 0.5 }, 1, 5, &mut rng) {
                Move::Swap(i, j) | Move::Reverse(i, j) => {
                    assert!(1 <= i && i < j && j < 5);
                }
            }
        }
    }
}
