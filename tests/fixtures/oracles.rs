//! Scripted routing oracles.

use std::sync::Mutex;

use itinerary_planner::polyline::Polyline;
use itinerary_planner::{Coordinates, OracleError, RoutingOracle, TravelMode};

/// A request seen by [`RecordingOracle`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Order { waypoints: Vec<Coordinates> },
    Path { from: Coordinates, to: Coordinates },
}

/// Visits waypoints in reverse input order; geometry is a straight line.
#[derive(Debug, Default)]
pub struct ReversingOracle;

impl RoutingOracle for ReversingOracle {
    fn optimize_order(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
        waypoints: &[Coordinates],
        _mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError> {
        Ok((0..waypoints.len()).rev().collect())
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, _mode: TravelMode) -> Result<String, OracleError> {
        Ok(Polyline::straight(origin, destination).encode())
    }
}

/// Records every request before delegating.
#[derive(Debug, Default)]
pub struct RecordingOracle<O> {
    inner: O,
    calls: Mutex<Vec<Call>>,
}

impl<O> RecordingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl<O: RoutingOracle> RoutingOracle for RecordingOracle<O> {
    fn optimize_order(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError> {
        self.calls.lock().unwrap().push(Call::Order {
            waypoints: waypoints.to_vec(),
        });
        self.inner.optimize_order(origin, destination, waypoints, mode)
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, mode: TravelMode) -> Result<String, OracleError> {
        self.calls.lock().unwrap().push(Call::Path {
            from: origin,
            to: destination,
        });
        self.inner.path(origin, destination, mode)
    }
}

/// Which request [`FailingNear`] rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Order,
    Path,
}

/// Fails any request that involves `poisoned`, otherwise behaves like
/// [`ReversingOracle`].
#[derive(Debug, Clone)]
pub struct FailingNear {
    pub poisoned: Coordinates,
    pub stage: Stage,
    pub error: OracleError,
}

impl FailingNear {
    pub fn new(poisoned: Coordinates, stage: Stage) -> Self {
        Self {
            poisoned,
            stage,
            error: OracleError::Status {
                code: "NoRoute".to_string(),
                message: None,
            },
        }
    }

    pub fn unavailable(poisoned: Coordinates) -> Self {
        Self {
            poisoned,
            stage: Stage::Order,
            error: OracleError::Unavailable("connection refused".to_string()),
        }
    }
}

impl RoutingOracle for FailingNear {
    fn optimize_order(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError> {
        if self.stage == Stage::Order && waypoints.contains(&self.poisoned) {
            return Err(self.error.clone());
        }
        ReversingOracle.optimize_order(origin, destination, waypoints, mode)
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, mode: TravelMode) -> Result<String, OracleError> {
        if self.stage == Stage::Path && (origin == self.poisoned || destination == self.poisoned) {
            return Err(self.error.clone());
        }
        ReversingOracle.path(origin, destination, mode)
    }
}

/// Returns the same index for every slot.
#[derive(Debug, Default)]
pub struct RepeatingOracle;

impl RoutingOracle for RepeatingOracle {
    fn optimize_order(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
        waypoints: &[Coordinates],
        _mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError> {
        Ok(vec![0; waypoints.len()])
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, _mode: TravelMode) -> Result<String, OracleError> {
        Ok(Polyline::straight(origin, destination).encode())
    }
}
