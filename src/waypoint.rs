//! Waypoints and 3D coordinates.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default tolerance below which two waypoints are considered duplicates.
pub const DEFAULT_DUPLICATE_EPSILON: f64 = 1e-9;

/// A point in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether all three components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance in 3D.
    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx.hypot(dy).hypot(dz)
    }

    /// Distance in the XY plane, ignoring altitude.
    pub fn planar_distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.hypot(dy)
    }
}

impl From<(f64, f64, f64)> for Point3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

/// A waypoint to be visited.
///
/// The `id` is the waypoint's stable index in the submitted set; routes
/// refer to waypoints by this index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    pub id: usize,
    pub position: Point3,
    /// Free-text note attached by the user (e.g. imported alongside the
    /// coordinate).
    pub label: Option<String>,
}

impl Waypoint {
    pub fn new(id: usize, x: f64, y: f64, z: f64) -> Self {
        Self {
            id,
            position: Point3::new(x, y, z),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builds a waypoint set from `(index, x, y, z)` tuples, the shape used
    /// by import/export collaborators.
    ///
    /// The tuples are sorted by index; indices must then be exactly
    /// `0..n`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_waypath::Waypoint;
    ///
    /// let wps = Waypoint::from_tuples(&[(1, 5.0, 0.0, 0.0), (0, 0.0, 0.0, 0.0)]).unwrap();
    /// assert_eq!(wps[0].id, 0);
    /// assert_eq!(wps[1].position.x, 5.0);
    /// ```
    pub fn from_tuples(tuples: &[(usize, f64, f64, f64)]) -> Result<Vec<Waypoint>> {
        let mut sorted = tuples.to_vec();
        sorted.sort_by_key(|t| t.0);
        let waypoints: Vec<Waypoint> = sorted
            .into_iter()
            .map(|(id, x, y, z)| Waypoint::new(id, x, y, z))
            .collect();
        check_ids(&waypoints)?;
        Ok(waypoints)
    }

    /// Builds a waypoint set from bare coordinates, numbering them in order.
    pub fn from_points<P: Into<Point3> + Copy>(points: &[P]) -> Vec<Waypoint> {
        points
            .iter()
            .enumerate()
            .map(|(id, &p)| Waypoint {
                id,
                position: p.into(),
                label: None,
            })
            .collect()
    }

    /// Converts back into an `(index, x, y, z)` tuple.
    pub fn to_tuple(&self) -> (usize, f64, f64, f64) {
        (self.id, self.position.x, self.position.y, self.position.z)
    }
}

/// Validates a waypoint set before it is submitted to a solve.
///
/// Rejects sets with fewer than 2 points, non-finite coordinates, ids that
/// do not match their position, and any two points closer than `epsilon`.
/// Duplicates are reported, never removed.
pub fn validate_waypoints(waypoints: &[Waypoint], epsilon: f64) -> Result<()> {
    if waypoints.len() < 2 {
        return Err(Error::invalid(format!(
            "at least 2 waypoints are required, got {}",
            waypoints.len()
        )));
    }
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(Error::invalid(format!(
            "duplicate epsilon must be finite and non-negative, got {epsilon}"
        )));
    }
    for wp in waypoints {
        if !wp.position.is_finite() {
            return Err(Error::invalid(format!(
                "waypoint {} has a non-finite coordinate ({}, {}, {})",
                wp.id, wp.position.x, wp.position.y, wp.position.z
            )));
        }
    }
    check_ids(waypoints)?;

    // O(n^2) pairwise scan; waypoint sets are small compared to the
    // quadratic cost matrix built right after.
    for i in 0..waypoints.len() {
        for j in (i + 1)..waypoints.len() {
            let d = waypoints[i].position.distance(&waypoints[j].position);
            if d <= epsilon {
                return Err(Error::invalid(format!(
                    "waypoints {i} and {j} are duplicates (distance {d} <= epsilon {epsilon})"
                )));
            }
        }
    }
    Ok(())
}

fn check_ids(waypoints: &[Waypoint]) -> Result<()> {
    for (pos, wp) in waypoints.iter().enumerate() {
        if wp.id != pos {
            return Err(Error::invalid(format!(
                "waypoint ids must be 0..n in order: position {pos} has id {}",
                wp.id
            )));
        }
    }
    Ok(())
}
