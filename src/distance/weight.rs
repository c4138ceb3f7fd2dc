//! Edge weight adjustments applied on top of the base distance.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::waypoint::{Point3, Waypoint};

/// How an edge weight modifies the base distance of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Adjustment {
    /// `cost = base * factor`.
    Multiply(f64),
    /// `cost = base + amount`. `f64::INFINITY` blocks the edge.
    Add(f64),
}

impl Adjustment {
    /// Leaves the base distance unchanged.
    pub const NONE: Adjustment = Adjustment::Add(0.0);

    pub fn apply(self, base: f64) -> f64 {
        match self {
            Adjustment::Multiply(factor) => base * factor,
            Adjustment::Add(amount) => base + amount,
        }
    }
}

/// Maps an ordered pair of waypoints to a cost adjustment.
///
/// The pair is ordered (`from` → `to`), so weights may be asymmetric.
/// Closures of the form `Fn(&Waypoint, &Waypoint) -> Adjustment`
/// implement this trait.
///
/// # Examples
///
/// ```
/// use u_waypath::distance::{Adjustment, CostMatrix, Metric};
/// use u_waypath::Waypoint;
///
/// let wps = Waypoint::from_points(&[(0.0, 0.0, 0.0), (3.0, 4.0, 0.0)]);
/// let double = |_: &Waypoint, _: &Waypoint| Adjustment::Multiply(2.0);
/// let m = CostMatrix::from_waypoints(&wps, Metric::Euclidean, Some(&double)).unwrap();
/// assert!((m.get(0, 1) - 10.0).abs() < 1e-12);
/// ```
pub trait EdgeWeight: Send + Sync {
    fn adjustment(&self, from: &Waypoint, to: &Waypoint) -> Adjustment;

    /// Applies the adjustment to `base`.
    fn apply(&self, from: &Waypoint, to: &Waypoint, base: f64) -> f64 {
        self.adjustment(from, to).apply(base)
    }
}

impl<F> EdgeWeight for F
where
    F: Fn(&Waypoint, &Waypoint) -> Adjustment + Send + Sync,
{
    fn adjustment(&self, from: &Waypoint, to: &Waypoint) -> Adjustment {
        self(from, to)
    }
}

/// Several weights applied in sequence.
impl EdgeWeight for Vec<Box<dyn EdgeWeight>> {
    fn adjustment(&self, _from: &Waypoint, _to: &Waypoint) -> Adjustment {
        Adjustment::NONE
    }

    fn apply(&self, from: &Waypoint, to: &Waypoint, base: f64) -> f64 {
        self.iter().fold(base, |cost, w| w.apply(from, to, cost))
    }
}

/// Charges extra for gaining altitude: `per_unit * max(0, to.z - from.z)`.
///
/// Descending is free, so the resulting matrix is asymmetric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClimbPenalty {
    pub per_unit: f64,
}

impl ClimbPenalty {
    pub fn new(per_unit: f64) -> Self {
        Self { per_unit }
    }
}

impl EdgeWeight for ClimbPenalty {
    fn adjustment(&self, from: &Waypoint, to: &Waypoint) -> Adjustment {
        let ascent = (to.position.z - from.position.z).max(0.0);
        Adjustment::Add(self.per_unit * ascent)
    }
}

/// A spherical obstacle. Edges whose straight segment passes through the
/// sphere are charged `penalty` (use `f64::INFINITY` to forbid them).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SphereObstacle {
    pub center: Point3,
    pub radius: f64,
    pub penalty: f64,
}

impl SphereObstacle {
    pub fn new(center: Point3, radius: f64, penalty: f64) -> Self {
        Self {
            center,
            radius,
            penalty,
        }
    }

    /// Whether the segment `a`–`b` comes strictly closer than `radius` to
    /// the center.
    pub fn intersects(&self, a: &Point3, b: &Point3) -> bool {
        let (abx, aby, abz) = (b.x - a.x, b.y - a.y, b.z - a.z);
        let len_sq = abx * abx + aby * aby + abz * abz;
        let t = if len_sq > 0.0 {
            let (acx, acy, acz) = (
                self.center.x - a.x,
                self.center.y - a.y,
                self.center.z - a.z,
            );
            ((acx * abx + acy * aby + acz * abz) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = Point3::new(a.x + t * abx, a.y + t * aby, a.z + t * abz);
        closest.distance(&self.center) < self.radius
    }
}

impl EdgeWeight for SphereObstacle {
    fn adjustment(&self, from: &Waypoint, to: &Waypoint) -> Adjustment {
        if self.intersects(&from.position, &to.position) {
            Adjustment::Add(self.penalty)
        } else {
            Adjustment::NONE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_apply() {
        assert_eq!(Adjustment::Multiply(1.5).apply(4.0), 6.0);
        assert_eq!(Adjustment::Add(2.0).apply(4.0), 6.0);
        assert_eq!(Adjustment::NONE.apply(4.0), 4.0);
    }

    #[test]
    fn test_climb_penalty_is_directional() {
        let low = Waypoint::new(0, 0.0, 0.0, 0.0);
        let high = Waypoint::new(1, 0.0, 0.0, 5.0);
        let w = ClimbPenalty::new(2.0);
        assert_eq!(w.adjustment(&low, &high), Adjustment::Add(10.0));
        assert_eq!(w.adjustment(&high, &low), Adjustment::Add(0.0));
    }

    #[test]
    fn test_sphere_intersection() {
        let obstacle = SphereObstacle::new(Point3::new(5.0, 0.0, 0.0), 1.0, 100.0);
        let a = Point3::new(0.0, 0.0, 0.0);
        let through = Point3::new(10.0, 0.0, 0.0);
        let beside = Point3::new(0.0, 10.0, 0.0);
        assert!(obstacle.intersects(&a, &through));
        assert!(!obstacle.intersects(&a, &beside));
        // Segment stopping short of the sphere.
        assert!(!obstacle.intersects(&a, &Point3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_stacked_weights() {
        let a = Waypoint::new(0, 0.0, 0.0, 0.0);
        let b = Waypoint::new(1, 0.0, 0.0, 1.0);
        let stack: Vec<Box<dyn EdgeWeight>> = vec![
            Box::new(|_: &Waypoint, _: &Waypoint| Adjustment::Multiply(3.0)),
            Box::new(ClimbPenalty::new(1.0)),
        ];
        assert!((stack.apply(&a, &b, 1.0) - 4.0).abs() < 1e-12);
    }
}
