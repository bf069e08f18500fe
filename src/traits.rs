//! Core seams of the planner.
//!
//! These are intentionally narrow. The pipeline only depends on these traits,
//! so routing services and grouping algorithms can be swapped without touching
//! the sequencer or the assembler.

use serde::{Deserialize, Serialize};

use crate::error::{OracleError, PlannerError};
use crate::geo_point::Coordinates;

/// How the traveller moves between stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
        }
    }
}

impl std::str::FromStr for TravelMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "driving" | "car" => Ok(TravelMode::Driving),
            "walking" | "foot" => Ok(TravelMode::Walking),
            "cycling" | "bicycling" | "bike" => Ok(TravelMode::Cycling),
            other => Err(format!("unknown travel mode '{other}'")),
        }
    }
}

/// External service supplying visiting order and path geometry.
pub trait RoutingOracle {
    /// Returns an optimized visiting order for `waypoints` on a trip from
    /// `origin` to `destination`.
    ///
    /// The result is a permutation of `0..waypoints.len()`: element `i` is the
    /// index of the waypoint visited `i`-th.
    fn optimize_order(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError>;

    /// Returns the encoded polyline of the path from `origin` to `destination`.
    fn path(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
    ) -> Result<String, OracleError>;
}

impl<O: RoutingOracle + ?Sized> RoutingOracle for &O {
    fn optimize_order(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError> {
        (**self).optimize_order(origin, destination, waypoints, mode)
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, mode: TravelMode) -> Result<String, OracleError> {
        (**self).path(origin, destination, mode)
    }
}

impl<O: RoutingOracle + ?Sized> RoutingOracle for Box<O> {
    fn optimize_order(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError> {
        (**self).optimize_order(origin, destination, waypoints, mode)
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, mode: TravelMode) -> Result<String, OracleError> {
        (**self).path(origin, destination, mode)
    }
}

/// Groups coordinates by proximity.
pub trait Partitioner {
    /// Assigns each of `coordinates` a group label in `0..k`.
    ///
    /// Implementations must be deterministic for identical input.
    fn labels(&self, coordinates: &[Coordinates], k: usize) -> Result<Vec<usize>, PlannerError>;
}

/// Provides a cost matrix for a set of locations.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coordinates]) -> Vec<Vec<f64>>;
}
