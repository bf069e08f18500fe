//! Google Directions API adapter.
//!
//! A single Directions call with `optimize:true` waypoints yields the visiting
//! order (`waypoint_order`); a call without waypoints yields the path geometry
//! (`overview_polyline`).

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::error::OracleError;
use crate::geo_point::Coordinates;
use crate::osrm::fetch_json;
use crate::traits::{RoutingOracle, TravelMode};

pub const DEFAULT_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GoogleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_DIRECTIONS_URL.to_string(),
            timeout_secs: 10,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[derive(Debug, Clone)]
pub struct GoogleDirectionsClient {
    config: GoogleConfig,
    client: reqwest::blocking::Client,
}

impl GoogleDirectionsClient {
    pub fn new(config: GoogleConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn directions_url(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<Url, OracleError> {
        let mut params = vec![
            ("origin", lat_lng(origin)),
            ("destination", lat_lng(destination)),
            ("mode", google_mode(mode).to_string()),
        ];
        if !waypoints.is_empty() {
            let stops = waypoints.iter().map(|c| lat_lng(*c)).collect::<Vec<_>>().join("|");
            params.push(("waypoints", format!("optimize:true|{stops}")));
        }
        params.push(("key", self.config.api_key.clone()));

        Url::parse_with_params(&self.config.base_url, &params)
            .map_err(|err| OracleError::Unavailable(format!("invalid directions URL: {err}")))
    }

    fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<GoogleRoute, OracleError> {
        let url = self.directions_url(origin, destination, waypoints, mode)?;
        debug!(waypoints = waypoints.len(), mode = mode.as_str(), "requesting Google directions");
        let body: GoogleDirectionsResponse = fetch_json(&self.client, url.as_str())?;
        first_route(body)
    }
}

impl RoutingOracle for GoogleDirectionsClient {
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
        Ok(self.directions(origin, destination, waypoints, mode)?.waypoint_order)
    }

    fn path(&self, origin: Coordinates, destination: Coordinates, mode: TravelMode) -> Result<String, OracleError> {
        self.directions(origin, destination, &[], mode)?
            .overview_polyline
            .map(|polyline| polyline.points)
            .ok_or_else(|| OracleError::Malformed("route has no overview_polyline".to_string()))
    }
}

fn lat_lng(c: Coordinates) -> String {
    format!("{},{}", c.lat, c.lng)
}

fn google_mode(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "driving",
        TravelMode::Walking => "walking",
        TravelMode::Cycling => "bicycling",
    }
}

fn first_route(body: GoogleDirectionsResponse) -> Result<GoogleRoute, OracleError> {
    if body.status != "OK" {
        return Err(OracleError::Status {
            code: body.status,
            message: body.error_message,
        });
    }
    body.routes.into_iter().next().ok_or_else(|| OracleError::Status {
        code: "ZERO_RESULTS".to_string(),
        message: Some("directions response contained no routes".to_string()),
    })
}

#[derive(Debug, Deserialize)]
struct GoogleDirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<GoogleRoute>,
}

#[derive(Debug, Deserialize)]
struct GoogleRoute {
    #[serde(default)]
    waypoint_order: Vec<usize>,
    overview_polyline: Option<GooglePolyline>,
}

#[derive(Debug, Deserialize)]
struct GooglePolyline {
    points: String,
}
