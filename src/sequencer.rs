//! Round-trip ordering of one day's points.

use serde::Serialize;
use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::error::OracleError;
use crate::geo_point::GeoPoint;
use crate::traits::{RoutingOracle, TravelMode};

/// Ordered stops of one day, starting and ending at the base point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Route(Vec<GeoPoint>);

impl Route {
    pub fn new(stops: Vec<GeoPoint>) -> Self {
        Self(stops)
    }

    pub fn stops(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(GeoPoint::name).collect()
    }
}

/// Path geometry between two consecutive stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSegment {
    pub from: String,
    pub to: String,
    /// Encoded polyline, passed through from the oracle.
    pub polyline: String,
}

#[derive(Debug, Clone)]
pub struct RouteSequencer<O> {
    oracle: O,
    mode: TravelMode,
    segments: bool,
}

impl<O: RoutingOracle> RouteSequencer<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            mode: TravelMode::Driving,
            segments: true,
        }
    }

    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Skip the per-segment geometry requests.
    pub fn without_segments(mut self) -> Self {
        self.segments = false;
        self
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    /// Orders `cluster` into a round trip from `base`.
    ///
    /// An empty cluster yields `[base, base]` with no segments and issues no
    /// oracle requests.
    pub fn sequence(&self, base: &GeoPoint, cluster: &Cluster) -> Result<(Route, Vec<RouteSegment>), OracleError> {
        if cluster.is_empty() {
            debug!("empty cluster, skipping routing");
            return Ok((Route::new(vec![base.clone(), base.clone()]), Vec::new()));
        }

        info!(stops = cluster.len(), "calculating optimal route");

        let waypoints: Vec<_> = cluster.members().iter().map(GeoPoint::coordinates).collect();
        let order = self
            .oracle
            .optimize_order(base.coordinates(), base.coordinates(), &waypoints, self.mode)?;
        check_permutation(&order, cluster.len())?;

        let mut stops = Vec::with_capacity(cluster.len() + 2);
        stops.push(base.clone());
        stops.extend(order.iter().map(|&index| cluster.members()[index].clone()));
        stops.push(base.clone());
        let route = Route::new(stops);

        let segments = if self.segments {
            self.segments_for(&route)?
        } else {
            Vec::new()
        };

        info!(stops = route.len(), segments = segments.len(), "route calculated");
        Ok((route, segments))
    }

    fn segments_for(&self, route: &Route) -> Result<Vec<RouteSegment>, OracleError> {
        route
            .stops()
            .windows(2)
            .map(|pair| {
                let (from, to) = (&pair[0], &pair[1]);
                debug!(from = from.name(), to = to.name(), "requesting segment geometry");
                let polyline = self.oracle.path(from.coordinates(), to.coordinates(), self.mode)?;
                Ok(RouteSegment {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    polyline,
                })
            })
            .collect()
    }
}

/// The oracle must return every index in `0..len` exactly once.
fn check_permutation(order: &[usize], len: usize) -> Result<(), OracleError> {
    if order.len() != len {
        return Err(OracleError::Malformed(format!(
            "visiting order has {} entries for {} waypoints",
            order.len(),
            len
        )));
    }

    let mut seen = vec![false; len];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(OracleError::Malformed(format!("waypoint {index} visited twice")));
            }
            None => {
                return Err(OracleError::Malformed(format!("waypoint index {index} out of range")));
            }
        }
    }

    Ok(())
}
