//! Offline routing oracle.
//!
//! Orders waypoints with a nearest-neighbour tour from the origin improved by
//! 2-opt, keeping both endpoints fixed. Geometry is the straight line between
//! the two stops. Deterministic and never fails, which makes it the fallback
//! when no routing service is configured.

use tracing::debug;

use crate::error::OracleError;
use crate::geo_point::Coordinates;
use crate::haversine::HaversineMatrix;
use crate::polyline::Polyline;
use crate::traits::{DistanceMatrixProvider, RoutingOracle, TravelMode};

/// Upper bound on 2-opt improvement passes.
const MAX_TWO_OPT_PASSES: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct LocalOracle<M = HaversineMatrix> {
    matrix: M,
}

impl<M: DistanceMatrixProvider> LocalOracle<M> {
    /// The travel mode is not consulted when ordering: only relative costs
    /// from `matrix` matter.
    pub fn new(matrix: M) -> Self {
        Self { matrix }
    }
}

impl<M: DistanceMatrixProvider> RoutingOracle for LocalOracle<M> {
    fn optimize_order(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        _mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError> {
        if waypoints.len() < 2 {
            return Ok((0..waypoints.len()).collect());
        }

        let mut locations = Vec::with_capacity(waypoints.len() + 2);
        locations.push(origin);
        locations.extend_from_slice(waypoints);
        locations.push(destination);

        let matrix = self.matrix.matrix_for(&locations);
        if matrix.len() != locations.len() || matrix.iter().any(|row| row.len() != locations.len()) {
            return Err(OracleError::Malformed(format!(
                "distance matrix is not {0}x{0}",
                locations.len()
            )));
        }

        let greedy = nearest_neighbor(&matrix, waypoints.len());
        let greedy_cost = path_cost(&matrix, &greedy);
        let (order, cost) = two_opt(&matrix, greedy, greedy_cost);
        debug!(waypoints = waypoints.len(), greedy_cost, cost, "local tour ordered");

        // Path indices 1..=n map back to waypoint indices 0..n.
        Ok(order[1..order.len() - 1].iter().map(|index| index - 1).collect())
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, _mode: TravelMode) -> Result<String, OracleError> {
        Ok(Polyline::straight(origin, destination).encode())
    }
}

/// Greedy open path `0 -> ... -> n + 1` through waypoints `1..=n`.
fn nearest_neighbor(matrix: &[Vec<f64>], n: usize) -> Vec<usize> {
    let mut visited = vec![false; n + 2];
    let mut order = Vec::with_capacity(n + 2);
    let mut current = 0;
    order.push(current);

    for _ in 0..n {
        let mut best_next = None;
        let mut best_cost = f64::INFINITY;
        for candidate in 1..=n {
            if !visited[candidate] && matrix[current][candidate] < best_cost {
                best_cost = matrix[current][candidate];
                best_next = Some(candidate);
            }
        }

        // Unreachable remainder (infinite costs): take the lowest unvisited index.
        let next = best_next.unwrap_or_else(|| (1..=n).find(|&c| !visited[c]).unwrap_or(1));
        visited[next] = true;
        order.push(next);
        current = next;
    }

    order.push(n + 1);
    order
}

fn path_cost(matrix: &[Vec<f64>], order: &[usize]) -> f64 {
    order.windows(2).map(|pair| matrix[pair[0]][pair[1]]).sum()
}

/// Reverses inner sub-paths while that lowers the cost. Endpoints stay put.
fn two_opt(matrix: &[Vec<f64>], mut order: Vec<usize>, mut cost: f64) -> (Vec<usize>, f64) {
    let last_inner = order.len() - 2;

    for _ in 0..MAX_TWO_OPT_PASSES {
        let mut improved = false;
        for i in 1..last_inner {
            for j in (i + 1)..=last_inner {
                order[i..=j].reverse();
                let candidate = path_cost(matrix, &order);
                if candidate + 1e-9 < cost {
                    cost = candidate;
                    improved = true;
                } else {
                    order[i..=j].reverse();
                }
            }
        }
        if !improved {
            break;
        }
    }

    (order, cost)
}
