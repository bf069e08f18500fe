//! OSRM HTTP adapter for visiting order and path geometry.
//!
//! Order comes from the Trip service, geometry from the Route service.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#trip-service>

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::OracleError;
use crate::geo_point::Coordinates;
use crate::traits::{RoutingOracle, TravelMode};

/// Longest response excerpt kept in an error message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct OsrmConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn trip_url(&self, locations: &[Coordinates], round_trip: bool, mode: TravelMode) -> String {
        let options = if round_trip {
            "roundtrip=true&source=first&overview=false"
        } else {
            "roundtrip=false&source=first&destination=last&overview=false"
        };
        format!(
            "{}/trip/v1/{}/{}?{}",
            self.base_url(),
            profile(mode),
            coordinate_list(locations),
            options
        )
    }

    fn route_url(&self, origin: Coordinates, destination: Coordinates, mode: TravelMode) -> String {
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline",
            self.base_url(),
            profile(mode),
            coordinate_list(&[origin, destination])
        )
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

impl RoutingOracle for OsrmClient {
    fn optimize_order(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Vec<usize>, OracleError> {
        if waypoints.is_empty() {
            return Ok(Vec::new());
        }

        let round_trip = origin == destination;
        let mut locations = Vec::with_capacity(waypoints.len() + 2);
        locations.push(origin);
        locations.extend_from_slice(waypoints);
        if !round_trip {
            locations.push(destination);
        }

        let url = self.trip_url(&locations, round_trip, mode);
        debug!(%url, waypoints = waypoints.len(), "requesting OSRM trip");
        let body: OsrmTripResponse = fetch_json(&self.client, &url)?;
        trip_order(&body, locations.len(), waypoints.len())
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, mode: TravelMode) -> Result<String, OracleError> {
        let url = self.route_url(origin, destination, mode);
        debug!(%url, "requesting OSRM route");
        let body: OsrmRouteResponse = fetch_json(&self.client, &url)?;
        route_geometry(body)
    }
}

fn profile(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "car",
        TravelMode::Walking => "foot",
        TravelMode::Cycling => "bike",
    }
}

fn coordinate_list(locations: &[Coordinates]) -> String {
    locations
        .iter()
        .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// GETs `url` and parses the JSON body.
///
/// Routing services often describe failures in a JSON body on a 4xx status,
/// so the body is parsed before the status is considered.
pub(crate) fn fetch_json<T: DeserializeOwned>(client: &reqwest::blocking::Client, url: &str) -> Result<T, OracleError> {
    let response = client.get(url).send()?;
    let status = response.status();
    let text = response.text()?;

    match serde_json::from_str::<T>(&text) {
        Ok(body) => Ok(body),
        Err(err) if status.is_success() => Err(OracleError::Malformed(err.to_string())),
        Err(_) => Err(OracleError::Status {
            code: status.as_u16().to_string(),
            message: Some(text.chars().take(MAX_ERROR_BODY).collect()),
        }),
    }
}

fn check_code(code: &str, message: &Option<String>) -> Result<(), OracleError> {
    if code == "Ok" {
        Ok(())
    } else {
        Err(OracleError::Status {
            code: code.to_string(),
            message: message.clone(),
        })
    }
}

/// Extracts the visiting order of the `waypoint_count` inputs that follow
/// the origin.
fn trip_order(body: &OsrmTripResponse, location_count: usize, waypoint_count: usize) -> Result<Vec<usize>, OracleError> {
    check_code(&body.code, &body.message)?;

    let snapped = body
        .waypoints
        .as_deref()
        .ok_or_else(|| OracleError::Malformed("trip response has no waypoints".to_string()))?;
    if snapped.len() != location_count {
        return Err(OracleError::Malformed(format!(
            "trip response has {} waypoints for {} locations",
            snapped.len(),
            location_count
        )));
    }
    if snapped.iter().any(|w| w.trips_index != 0) {
        return Err(OracleError::Malformed(
            "locations were split across several trips".to_string(),
        ));
    }

    let mut visits: Vec<(usize, usize)> = snapped[1..=waypoint_count]
        .iter()
        .enumerate()
        .map(|(index, w)| (w.waypoint_index, index))
        .collect();
    visits.sort_unstable();

    Ok(visits.into_iter().map(|(_, index)| index).collect())
}

fn route_geometry(body: OsrmRouteResponse) -> Result<String, OracleError> {
    check_code(&body.code, &body.message)?;

    body.routes
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|route| route.geometry)
        .ok_or_else(|| OracleError::Status {
            code: "NoRoute".to_string(),
            message: Some("route response contained no geometry".to_string()),
        })
}

#[derive(Debug, Deserialize)]
struct OsrmTripResponse {
    code: String,
    message: Option<String>,
    waypoints: Option<Vec<OsrmTripWaypoint>>,
}

#[derive(Debug, Deserialize)]
struct OsrmTripWaypoint {
    waypoint_index: usize,
    #[serde(default)]
    trips_index: usize,
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    routes: Option<Vec<OsrmRoute>>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: Option<String>,
}
