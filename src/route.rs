//! Routes: ordered visiting sequences over waypoints.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::distance::CostMatrix;
use crate::error::{Error, Result};
use crate::waypoint::{Point3, Waypoint};

/// Whether a route ends where it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RouteKind {
    /// Visit every waypoint once; no return edge.
    Open,
    /// Visit every waypoint once and return to the start.
    #[default]
    Closed,
}

/// An ordered visiting sequence over waypoint indices.
///
/// An open route is a permutation of `0..n`. A closed route is a
/// permutation followed by its first index again, so its length is `n + 1`.
///
/// # Examples
///
/// ```
/// use u_waypath::{Route, RouteKind};
///
/// let r = Route::new(vec![0, 2, 1], RouteKind::Closed);
/// assert_eq!(r.indices(), &[0, 2, 1, 0]);
/// assert_eq!(r.order(), &[0, 2, 1]);
/// assert!(r.validate(3).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    indices: Vec<usize>,
    kind: RouteKind,
}

impl Route {
    /// Builds a route from a visit order given without the closing repeat.
    pub fn new(order: Vec<usize>, kind: RouteKind) -> Self {
        let mut indices = order;
        if kind == RouteKind::Closed {
            if let Some(&first) = indices.first() {
                indices.push(first);
            }
        }
        Self { indices, kind }
    }

    pub fn open(order: Vec<usize>) -> Self {
        Self::new(order, RouteKind::Open)
    }

    pub fn closed(order: Vec<usize>) -> Self {
        Self::new(order, RouteKind::Closed)
    }

    /// Identity order `0, 1, ..., n-1`.
    pub fn identity(n: usize, kind: RouteKind) -> Self {
        Self::new((0..n).collect(), kind)
    }

    /// All indices in travel order, including the closing repeat.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Visit order without the closing repeat.
    pub fn order(&self) -> &[usize] {
        match self.kind {
            RouteKind::Closed if !self.indices.is_empty() => {
                &self.indices[..self.indices.len() - 1]
            }
            _ => &self.indices,
        }
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    /// Number of indices, including the closing repeat.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of distinct waypoints visited.
    pub fn waypoint_count(&self) -> usize {
        self.order().len()
    }

    pub fn start(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    /// Sum of consecutive edge costs under `matrix`.
    pub fn cost(&self, matrix: &CostMatrix) -> f64 {
        self.indices
            .windows(2)
            .map(|w| matrix.get(w[0], w[1]))
            .sum()
    }

    /// Checks that the route visits each of `0..n` exactly once (plus the
    /// closing repeat for closed routes).
    pub fn validate(&self, n: usize) -> Result<()> {
        let expected = match self.kind {
            RouteKind::Open => n,
            RouteKind::Closed => n + 1,
        };
        if self.indices.len() != expected {
            return Err(Error::invalid(format!(
                "route has {} indices, expected {expected} for {n} waypoints",
                self.indices.len()
            )));
        }
        if self.kind == RouteKind::Closed && self.indices.first() != self.indices.last() {
            return Err(Error::invalid("closed route must end at its start"));
        }
        check_permutation(self.order(), n)
    }

    /// Ordered coordinates for a visualization collaborator.
    ///
    /// Indices outside `waypoints` are skipped.
    pub fn points(&self, waypoints: &[Waypoint]) -> Vec<Point3> {
        self.indices
            .iter()
            .filter_map(|&i| waypoints.get(i).map(|wp| wp.position))
            .collect()
    }

    /// Rotates a closed route so that it starts at `start`.
    ///
    /// Open routes and routes not containing `start` are returned unchanged.
    pub fn rotated_to(&self, start: usize) -> Route {
        if self.kind != RouteKind::Closed {
            return self.clone();
        }
        let order = self.order();
        match order.iter().position(|&i| i == start) {
            Some(pos) => {
                let mut rotated = order.to_vec();
                rotated.rotate_left(pos);
                Route::closed(rotated)
            }
            None => self.clone(),
        }
    }

    /// Consumes the route, returning the visit order without the closing
    /// repeat.
    pub fn into_order(mut self) -> Vec<usize> {
        if self.kind == RouteKind::Closed {
            self.indices.pop();
        }
        self.indices
    }
}

/// Checks that `order` is a permutation of `0..n`.
pub(crate) fn check_permutation(order: &[usize], n: usize) -> Result<()> {
    if order.len() != n {
        return Err(Error::invalid(format!(
            "route visits {} waypoints, expected {n}",
            order.len()
        )));
    }
    let mut seen = vec![false; n];
    for &i in order {
        if i >= n {
            return Err(Error::invalid(format!(
                "route index {i} out of range for {n} waypoints"
            )));
        }
        if seen[i] {
            return Err(Error::invalid(format!("route visits waypoint {i} twice")));
        }
        seen[i] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_route() {
        let r = Route::open(vec![2, 0, 1]);
        assert_eq!(r.len(), 3);
        assert_eq!(r.order(), &[2, 0, 1]);
        assert_eq!(r.start(), Some(2));
        assert!(r.validate(3).is_ok());
    }

    #[test]
    fn test_closed_route_shape() {
        let r = Route::closed(vec![0, 1, 2, 3]);
        assert_eq!(r.len(), 5);
        assert_eq!(r.waypoint_count(), 4);
        assert!(r.validate(4).is_ok());
        assert_eq!(r.into_order(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_omissions() {
        assert!(Route::open(vec![0, 1, 1]).validate(3).is_err());
        assert!(Route::open(vec![0, 1]).validate(3).is_err());
        assert!(Route::open(vec![0, 1, 5]).validate(3).is_err());
        assert!(Route::closed(vec![0, 1, 2]).validate(4).is_err());
    }

    #[test]
    fn test_cost_square() {
        let m = CostMatrix::from_data(
            4,
            vec![
                0.0, 1.0, 2.0, 1.0, //
                1.0, 0.0, 1.0, 2.0, //
                2.0, 1.0, 0.0, 1.0, //
                1.0, 2.0, 1.0, 0.0,
            ],
        )
        .unwrap();
        assert_eq!(Route::open(vec![0, 1, 2, 3]).cost(&m), 3.0);
        assert_eq!(Route::closed(vec![0, 1, 2, 3]).cost(&m), 4.0);
        assert_eq!(Route::closed(vec![0, 2, 1, 3]).cost(&m), 6.0);
    }

    #[test]
    fn test_rotated_to() {
        let r = Route::closed(vec![2, 3, 0, 1]).rotated_to(0);
        assert_eq!(r.indices(), &[0, 1, 2, 3, 0]);
        let open = Route::open(vec![2, 0, 1]);
        assert_eq!(open.rotated_to(0), open);
    }

    #[test]
    fn test_points() {
        let wps = Waypoint::from_points(&[(0.0, 0.0, 0.0), (1.0, 2.0, 3.0)]);
        let pts = Route::closed(vec![1, 0]).points(&wps);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0], Point3::new(1.0, 2.0, 3.0));
        assert_eq!(pts[2], pts[0]);
    }
}
