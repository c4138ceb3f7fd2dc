//! Dense cost matrix.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::weight::EdgeWeight;
use crate::error::{Error, Result};
use crate::route::RouteKind;
use crate::waypoint::{Point3, Waypoint};

/// Base distance between two waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Metric {
    /// `sqrt(dx² + dy² + dz²)`.
    #[default]
    Euclidean,
    /// `sqrt(dx² + dy²)`: plans in the horizontal plane, ignoring altitude.
    Planar,
}

impl Metric {
    pub fn distance(self, a: &Point3, b: &Point3) -> f64 {
        match self {
            Metric::Euclidean => a.distance(b),
            Metric::Planar => a.planar_distance(b),
        }
    }
}

/// A dense n×n cost matrix stored in row-major order.
///
/// `get(i, j)` is the cost of travelling from waypoint `i` to waypoint `j`.
/// Costs are non-negative; `f64::INFINITY` marks a blocked edge. The
/// diagonal is zero. The matrix is immutable once built and can be shared
/// read-only between concurrent solves.
///
/// # Examples
///
/// ```
/// use u_waypath::distance::{CostMatrix, Metric};
/// use u_waypath::Waypoint;
///
/// let wps = Waypoint::from_points(&[(0.0, 0.0, 0.0), (3.0, 4.0, 0.0), (3.0, 4.0, 12.0)]);
/// let m = CostMatrix::from_waypoints(&wps, Metric::Euclidean, None).unwrap();
/// assert!((m.get(0, 1) - 5.0).abs() < 1e-12);
/// assert!((m.get(0, 2) - 13.0).abs() < 1e-12);
/// assert!(m.is_symmetric());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CostMatrix {
    data: Vec<f64>,
    size: usize,
    symmetric: bool,
}

impl CostMatrix {
    /// Computes the cost matrix of a waypoint set.
    ///
    /// Waypoints are addressed by position. With a `weight`, each ordered
    /// pair's base distance is passed through [`EdgeWeight::apply`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when fewer than 2 waypoints are given, a
    /// coordinate is non-finite, or a weight yields a negative or NaN cost.
    pub fn from_waypoints(
        waypoints: &[Waypoint],
        metric: Metric,
        weight: Option<&dyn EdgeWeight>,
    ) -> Result<Self> {
        let n = waypoints.len();
        if n < 2 {
            return Err(Error::invalid(format!(
                "cost matrix needs at least 2 waypoints, got {n}"
            )));
        }
        if let Some(wp) = waypoints.iter().find(|wp| !wp.position.is_finite()) {
            return Err(Error::invalid(format!(
                "waypoint {} has a non-finite coordinate",
                wp.id
            )));
        }

        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                // Unweighted distances are symmetric: compute once, mirror.
                if weight.is_none() && j < i {
                    data[i * n + j] = data[j * n + i];
                    continue;
                }
                let base = metric.distance(&waypoints[i].position, &waypoints[j].position);
                // Finite coordinates whose difference overflows; +inf is
                // reserved for blocked edges.
                if !base.is_finite() {
                    return Err(Error::invalid(format!(
                        "distance between waypoints {i} and {j} overflows"
                    )));
                }
                data[i * n + j] = match weight {
                    Some(w) => w.apply(&waypoints[i], &waypoints[j], base),
                    None => base,
                };
            }
        }

        Self::from_data(n, data)
    }

    /// Creates a matrix from explicit row-major data.
    ///
    /// The diagonal is forced to zero. Asymmetric data is allowed.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when `size < 2`, the length is not
    /// `size * size`, or an off-diagonal entry is negative or NaN.
    pub fn from_data(size: usize, mut data: Vec<f64>) -> Result<Self> {
        if size < 2 {
            return Err(Error::invalid(format!(
                "cost matrix needs at least 2 waypoints, got {size}"
            )));
        }
        if data.len() != size * size {
            return Err(Error::invalid(format!(
                "cost matrix data has {} entries, expected {}",
                data.len(),
                size * size
            )));
        }
        for i in 0..size {
            data[i * size + i] = 0.0;
        }
        if let Some(pos) = data.iter().position(|c| c.is_nan() || *c < 0.0) {
            return Err(Error::invalid(format!(
                "cost({}, {}) = {} is not a non-negative number",
                pos / size,
                pos % size,
                data[pos]
            )));
        }

        let symmetric =
            (0..size).all(|i| ((i + 1)..size).all(|j| data[i * size + j] == data[j * size + i]));

        Ok(Self {
            data,
            size,
            symmetric,
        })
    }

    /// Cost of travelling from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Number of waypoints covered by this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether `get(i, j) == get(j, i)` for every pair.
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Row-major view of all costs.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mean of the finite off-diagonal costs, or 0 if there are none.
    pub fn mean_edge_cost(&self) -> f64 {
        let (sum, count) = self.off_diagonal().filter(|c| c.is_finite()).fold(
            (0.0, 0usize),
            |(s, k), c| (s + c, k + 1),
        );
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Largest finite off-diagonal cost, or 0 if there are none.
    pub fn max_finite_cost(&self) -> f64 {
        self.off_diagonal()
            .filter(|c| c.is_finite())
            .fold(0.0, f64::max)
    }

    /// Whether at least one off-diagonal edge is not blocked.
    pub fn has_finite_edges(&self) -> bool {
        self.off_diagonal().any(|c| c.is_finite())
    }

    /// Whether every off-diagonal edge is finite.
    pub fn is_complete(&self) -> bool {
        self.off_diagonal().all(|c| c.is_finite())
    }

    /// Total cost of visiting `order` as a route of the given kind.
    ///
    /// `order` is the visit sequence without a closing repeat; for
    /// [`RouteKind::Closed`] the edge back to the first waypoint is added.
    pub fn route_cost(&self, order: &[usize], kind: RouteKind) -> f64 {
        let open: f64 = order.windows(2).map(|w| self.get(w[0], w[1])).sum();
        match (kind, order.first(), order.last()) {
            (RouteKind::Closed, Some(&first), Some(&last)) if order.len() > 1 => {
                open + self.get(last, first)
            }
            _ => open,
        }
    }

    fn off_diagonal(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.size;
        self.data
            .iter()
            .enumerate()
            .filter(move |(k, _)| k / n != k % n)
            .map(|(_, &c)| c)
    }
}

/// Computes the plain Euclidean cost matrix, or a weighted one.
///
/// Shorthand for [`CostMatrix::from_waypoints`] with [`Metric::Euclidean`].
pub fn compute_cost_matrix(
    waypoints: &[Waypoint],
    weight: Option<&dyn EdgeWeight>,
) -> Result<CostMatrix> {
    CostMatrix::from_waypoints(waypoints, Metric::Euclidean, weight)
}
