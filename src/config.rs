//! Planner configuration.
//!
//! Read from the process environment (and a `.env` file when present):
//!
//! | Variable | Default |
//! |---|---|
//! | `PLANNER_ORACLE` | `osrm` (`google`, `haversine`) |
//! | `OSRM_BASE_URL` / `OSRM_TIMEOUT_SECS` | `http://localhost:5000` / `10` |
//! | `GOOGLE_MAPS_API_KEY` | required for `google` |
//! | `GOOGLE_DIRECTIONS_URL` / `GOOGLE_TIMEOUT_SECS` | Google endpoint / `10` |
//! | `PLANNER_TRAVEL_MODE` | `driving` |
//! | `PLANNER_SEED` / `PLANNER_MAX_ITER` / `PLANNER_N_INIT` | `0` / `300` / `1` |
//! | `PLANNER_PARALLEL_DAYS` | `false` |
//! | `PLANNER_SEGMENTS` | `true` |

use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::cluster::Clusterer;
use crate::google::{GoogleConfig, GoogleDirectionsClient};
use crate::haversine::HaversineMatrix;
use crate::itinerary::ItineraryAssembler;
use crate::kmeans::{KMeans, KMeansConfig};
use crate::local::LocalOracle;
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::sequencer::RouteSequencer;
use crate::traits::{RoutingOracle, TravelMode};

/// Oracle handle shared across days.
pub type SharedOracle = Box<dyn RoutingOracle + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown routing oracle '{0}' (expected osrm, google or haversine)")]
    UnknownOracle(String),

    #[error("GOOGLE_MAPS_API_KEY is required for the google oracle")]
    MissingApiKey,

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleBackend {
    Osrm(OsrmConfig),
    Google(GoogleConfig),
    /// Offline straight-line routing.
    Haversine,
}

impl Default for OracleBackend {
    fn default() -> Self {
        OracleBackend::Osrm(OsrmConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub oracle: OracleBackend,
    pub mode: TravelMode,
    pub clustering: KMeansConfig,
    pub parallel_days: bool,
    pub segments: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            oracle: OracleBackend::default(),
            mode: TravelMode::default(),
            clustering: KMeansConfig::default(),
            parallel_days: false,
            segments: true,
        }
    }
}

impl PlannerConfig {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// Entries in `overrides` win over the environment.
    pub fn from_env(overrides: &[(&str, String)]) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup_with_overrides(overrides, |key| std::env::var(key).ok())
    }

    pub fn from_lookup_with_overrides<F>(overrides: &[(&str, String)], lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| {
            overrides
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.clone())
                .or_else(|| lookup(key))
        })
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let oracle = oracle_backend(&lookup)?;

        let mode = match lookup("PLANNER_TRAVEL_MODE") {
            Some(value) => TravelMode::from_str(&value).map_err(|message| ConfigError::InvalidValue {
                key: "PLANNER_TRAVEL_MODE",
                message,
            })?,
            None => defaults.mode,
        };

        let clustering = KMeansConfig {
            seed: parsed(&lookup, "PLANNER_SEED")?.unwrap_or(defaults.clustering.seed),
            max_iter: parsed(&lookup, "PLANNER_MAX_ITER")?.unwrap_or(defaults.clustering.max_iter),
            n_init: parsed(&lookup, "PLANNER_N_INIT")?.unwrap_or(defaults.clustering.n_init),
        };

        Ok(Self {
            oracle,
            mode,
            clustering,
            parallel_days: flag(&lookup, "PLANNER_PARALLEL_DAYS")?.unwrap_or(defaults.parallel_days),
            segments: flag(&lookup, "PLANNER_SEGMENTS")?.unwrap_or(defaults.segments),
        })
    }

    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_parallel_days(mut self, parallel_days: bool) -> Self {
        self.parallel_days = parallel_days;
        self
    }

    pub fn with_segments(mut self, segments: bool) -> Self {
        self.segments = segments;
        self
    }

    pub fn build_oracle(&self) -> Result<SharedOracle, ConfigError> {
        let oracle: SharedOracle = match &self.oracle {
            OracleBackend::Osrm(config) => Box::new(OsrmClient::new(config.clone())?),
            OracleBackend::Google(config) => Box::new(GoogleDirectionsClient::new(config.clone())?),
            OracleBackend::Haversine => Box::new(LocalOracle::new(HaversineMatrix::for_mode(self.mode))),
        };
        Ok(oracle)
    }

    /// An assembler wired with this configuration's oracle and clustering.
    pub fn assembler(&self) -> Result<ItineraryAssembler<SharedOracle>, ConfigError> {
        let mut sequencer = RouteSequencer::new(self.build_oracle()?).with_mode(self.mode);
        if !self.segments {
            sequencer = sequencer.without_segments();
        }
        let clusterer = Clusterer::new(KMeans::new(self.clustering.clone()));

        Ok(ItineraryAssembler::with_parts(clusterer, sequencer).with_parallel_days(self.parallel_days))
    }
}

fn oracle_backend<F>(lookup: &F) -> Result<OracleBackend, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let name = lookup("PLANNER_ORACLE").unwrap_or_else(|| "osrm".to_string());

    match name.trim().to_ascii_lowercase().as_str() {
        "osrm" => {
            let mut config = OsrmConfig::default();
            if let Some(base_url) = lookup("OSRM_BASE_URL") {
                config.base_url = base_url;
            }
            if let Some(timeout) = parsed(lookup, "OSRM_TIMEOUT_SECS")? {
                config.timeout_secs = timeout;
            }
            Ok(OracleBackend::Osrm(config))
        }
        "google" => {
            let api_key = lookup("GOOGLE_MAPS_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .ok_or(ConfigError::MissingApiKey)?;
            let mut config = GoogleConfig::new(api_key);
            if let Some(base_url) = lookup("GOOGLE_DIRECTIONS_URL") {
                config = config.with_base_url(base_url);
            }
            if let Some(timeout) = parsed(lookup, "GOOGLE_TIMEOUT_SECS")? {
                config = config.with_timeout_secs(timeout);
            }
            Ok(OracleBackend::Google(config))
        }
        "haversine" | "local" => Ok(OracleBackend::Haversine),
        other => Err(ConfigError::UnknownOracle(other.to_string())),
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|err| ConfigError::InvalidValue {
                key,
                message: format!("'{value}': {err}"),
            })
        })
        .transpose()
}

fn flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key,
                message: format!("'{value}' is not a boolean"),
            }),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<PlannerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        PlannerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.oracle, OracleBackend::Osrm(OsrmConfig::default()));
        assert!(config.segments);
        assert!(!config.parallel_days);
    }

    #[test]
    fn test_osrm_overrides() {
        let config = config(&[
            ("OSRM_BASE_URL", "http://router.project-osrm.org"),
            ("OSRM_TIMEOUT_SECS", "30"),
            ("PLANNER_TRAVEL_MODE", "walking"),
            ("PLANNER_SEED", "42"),
            ("PLANNER_PARALLEL_DAYS", "yes"),
        ])
        .unwrap();

        assert_eq!(
            config.oracle,
            OracleBackend::Osrm(OsrmConfig::new("http://router.project-osrm.org").with_timeout_secs(30))
        );
        assert_eq!(config.mode, TravelMode::Walking);
        assert_eq!(config.clustering.seed, 42);
        assert!(config.parallel_days);
    }

    #[test]
    fn test_google_requires_key() {
        assert!(matches!(
            config(&[("PLANNER_ORACLE", "google")]),
            Err(ConfigError::MissingApiKey)
        ));

        let config = config(&[("PLANNER_ORACLE", "Google"), ("GOOGLE_MAPS_API_KEY", "abc")]).unwrap();
        assert_eq!(config.oracle, OracleBackend::Google(GoogleConfig::new("abc")));
    }

    #[test]
    fn test_google_url_and_timeout() {
        let config = config(&[
            ("PLANNER_ORACLE", "google"),
            ("GOOGLE_MAPS_API_KEY", "abc"),
            ("GOOGLE_DIRECTIONS_URL", "http://127.0.0.1:8080/directions/json"),
            ("GOOGLE_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(
            config.oracle,
            OracleBackend::Google(
                GoogleConfig::new("abc")
                    .with_base_url("http://127.0.0.1:8080/directions/json")
                    .with_timeout_secs(3)
            )
        );
    }

    #[test]
    fn test_overrides_win_over_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([("PLANNER_ORACLE", "osrm"), ("PLANNER_SEED", "7")]);
        let overrides = [("PLANNER_ORACLE", "haversine".to_string())];

        let config =
            PlannerConfig::from_lookup_with_overrides(&overrides, |key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.oracle, OracleBackend::Haversine);
        assert_eq!(config.clustering.seed, 7);
    }

    #[test]
    fn test_unknown_oracle() {
        assert!(matches!(
            config(&[("PLANNER_ORACLE", "mapquest")]),
            Err(ConfigError::UnknownOracle(name)) if name == "mapquest"
        ));
    }

    #[test]
    fn test_invalid_numbers_and_flags() {
        assert!(matches!(
            config(&[("PLANNER_SEED", "zero")]),
            Err(ConfigError::InvalidValue { key: "PLANNER_SEED", .. })
        ));
        assert!(matches!(
            config(&[("PLANNER_SEGMENTS", "maybe")]),
            Err(ConfigError::InvalidValue { key: "PLANNER_SEGMENTS", .. })
        ));
        assert!(matches!(
            config(&[("PLANNER_TRAVEL_MODE", "hovercraft")]),
            Err(ConfigError::InvalidValue { key: "PLANNER_TRAVEL_MODE", .. })
        ));
    }

    #[test]
    fn test_haversine_assembler_builds() {
        let config = config(&[("PLANNER_ORACLE", "haversine")]).unwrap();
        assert_eq!(config.oracle, OracleBackend::Haversine);
        assert!(config.assembler().is_ok());
    }
}
