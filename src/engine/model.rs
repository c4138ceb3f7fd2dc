//! Routing model definition.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single-vehicle routing model: visit every node once, starting and
/// ending at the depot, minimizing the sum of integer arc costs.
///
/// Arcs without a cost are forbidden. Self-arcs are ignored.
///
/// # Examples
///
/// ```
/// use u_waypath::engine::RoutingModel;
///
/// let mut model = RoutingModel::new(3, 0);
/// model.set_arc_cost(0, 1, Some(5));
/// model.set_arc_cost(1, 2, Some(5));
/// model.set_arc_cost(2, 0, Some(5));
/// assert_eq!(model.tour_cost(&[0, 1, 2]), Some(15));
/// assert_eq!(model.tour_cost(&[0, 2, 1]), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutingModel {
    num_nodes: usize,
    depot: usize,
    arcs: Vec<Option<i64>>,
}

impl RoutingModel {
    /// Creates a model with every arc forbidden.
    pub fn new(num_nodes: usize, depot: usize) -> Self {
        Self {
            num_nodes,
            depot,
            arcs: vec![None; num_nodes * num_nodes],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    /// Sets the cost of arc `from -> to`; `None` forbids it.
    pub fn set_arc_cost(&mut self, from: usize, to: usize, cost: Option<i64>) {
        self.arcs[from * self.num_nodes + to] = cost;
    }

    #[inline]
    pub fn arc_cost(&self, from: usize, to: usize) -> Option<i64> {
        self.arcs[from * self.num_nodes + to]
    }

    /// Cost of the closed tour `tour` (depot first, return arc implied),
    /// or `None` if it uses a forbidden arc.
    pub fn tour_cost(&self, tour: &[usize]) -> Option<i64> {
        let (&first, &last) = (tour.first()?, tour.last()?);
        let mut total = 0i64;
        for w in tour.windows(2) {
            total = total.checked_add(self.arc_cost(w[0], w[1])?)?;
        }
        if tour.len() > 1 {
            total = total.checked_add(self.arc_cost(last, first)?)?;
        }
        Some(total)
    }

    /// Validates the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_nodes == 0 {
            return Err("model has no nodes".into());
        }
        if self.depot >= self.num_nodes {
            return Err(format!(
                "depot {} out of range for {} nodes",
                self.depot, self.num_nodes
            ));
        }
        if let Some(pos) = self.arcs.iter().position(|c| c.is_some_and(|c| c < 0)) {
            return Err(format!(
                "arc {} -> {} has a negative cost",
                pos / self.num_nodes,
                pos % self.num_nodes
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(RoutingModel::new(0, 0).validate().is_err());
        assert!(RoutingModel::new(3, 3).validate().is_err());
        let mut model = RoutingModel::new(2, 0);
        assert!(model.validate().is_ok());
        model.set_arc_cost(0, 1, Some(-1));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_single_node_tour() {
        let model = RoutingModel::new(1, 0);
        assert_eq!(model.tour_cost(&[0]), Some(0));
        assert_eq!(model.tour_cost(&[]), None);
    }
}
