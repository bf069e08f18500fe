use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use itinerary_planner::config::PlannerConfig;
use itinerary_planner::{ItineraryRequest, PlannerError, TravelMode};

/// Plan a multi-day round-trip itinerary from a JSON request.
#[derive(Debug, Parser)]
#[command(name = "itinerary-planner", version, about)]
struct Cli {
    /// Request file (`{hotel, places, days}`); reads stdin when omitted.
    #[arg(long, short)]
    request: Option<PathBuf>,

    /// Override the request's day count.
    #[arg(long)]
    days: Option<i64>,

    /// Routing oracle: osrm, google or haversine.
    #[arg(long)]
    oracle: Option<String>,

    /// Travel mode: driving, walking or cycling.
    #[arg(long)]
    mode: Option<TravelMode>,

    /// Sequence days concurrently.
    #[arg(long)]
    parallel: bool,

    /// Skip per-segment geometry requests.
    #[arg(long)]
    no_segments: bool,

    /// Pretty-print the itinerary.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

impl Cli {
    /// Settings the command line forces over the environment.
    fn overrides(&self) -> Vec<(&'static str, String)> {
        self.oracle
            .iter()
            .map(|oracle| ("PLANNER_ORACLE", oracle.clone()))
            .collect()
    }

    fn configure(&self, mut config: PlannerConfig) -> PlannerConfig {
        if let Some(mode) = self.mode {
            config = config.with_mode(mode);
        }
        if self.parallel {
            config = config.with_parallel_days(true);
        }
        if self.no_segments {
            config = config.with_segments(false);
        }
        config
    }

    fn apply_days(&self, request: &mut ItineraryRequest) {
        if let Some(days) = self.days {
            request.days = days;
        }
    }
}

/// 2 when the request itself was rejected, 1 for any other failure.
fn exit_status(err: &PlannerError) -> u8 {
    if err.is_client_error() { 2 } else { 1 }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = PlannerConfig::from_env(&cli.overrides()).wrap_err("invalid planner configuration")?;
    let config = cli.configure(config);

    let mut request = read_request(cli.request.as_deref())?;
    cli.apply_days(&mut request);
    info!(days = request.days, places = request.places.len(), "received itinerary request");

    let assembler = config.assembler().wrap_err("failed to set up routing oracle")?;
    match assembler.plan(&request) {
        Ok(itinerary) => {
            let mut stdout = io::stdout().lock();
            if cli.pretty {
                serde_json::to_writer_pretty(&mut stdout, &itinerary)?;
            } else {
                serde_json::to_writer(&mut stdout, &itinerary)?;
            }
            writeln!(stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(error = %err, "itinerary request failed");
            Ok(ExitCode::from(exit_status(&err)))
        }
    }
}

fn read_request(path: Option<&Path>) -> Result<ItineraryRequest> {
    let body = match path {
        Some(path) => std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body).wrap_err("failed to read request from stdin")?;
            body
        }
    };
    serde_json::from_str(&body).wrap_err("request is not a valid itinerary request")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use itinerary_planner::config::{ConfigError, OracleBackend};
    use itinerary_planner::haversine::HaversineMatrix;
    use itinerary_planner::local::LocalOracle;
    use itinerary_planner::traits::Partitioner;
    use itinerary_planner::{Clusterer, Coordinates, GeoPoint, ItineraryAssembler, RouteSequencer};

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("itinerary-planner").chain(args.iter().copied())).unwrap()
    }

    fn config_for(cli: &Cli, vars: &[(&str, &str)]) -> Result<PlannerConfig, ConfigError> {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        PlannerConfig::from_lookup_with_overrides(&cli.overrides(), |key| vars.get(key).map(|v| v.to_string()))
            .map(|config| cli.configure(config))
    }

    fn request(days: i64) -> ItineraryRequest {
        ItineraryRequest::new(
            GeoPoint::new("Hotel", 13.7285038, 100.5656622),
            vec![
                GeoPoint::new("DJ Plus", 13.7362187, 100.5560414),
                GeoPoint::new("Mega Plaza", 13.7467888, 100.4992271),
            ],
            days,
        )
    }

    #[test]
    fn test_oracle_flag_overrides_environment() {
        let config = config_for(&cli(&["--oracle", "haversine"]), &[("PLANNER_ORACLE", "osrm")]).unwrap();
        assert_eq!(config.oracle, OracleBackend::Haversine);

        let config = config_for(&cli(&[]), &[("PLANNER_ORACLE", "haversine")]).unwrap();
        assert_eq!(config.oracle, OracleBackend::Haversine);
    }

    #[test]
    fn test_google_flag_still_needs_key() {
        assert!(matches!(
            config_for(&cli(&["--oracle", "google"]), &[]),
            Err(ConfigError::MissingApiKey)
        ));
        let config = config_for(&cli(&["--oracle", "google"]), &[("GOOGLE_MAPS_API_KEY", "abc")]).unwrap();
        assert!(matches!(config.oracle, OracleBackend::Google(_)));
    }

    #[test]
    fn test_flags_adjust_config() {
        let config = config_for(
            &cli(&["--oracle", "haversine", "--mode", "walking", "--parallel", "--no-segments"]),
            &[("PLANNER_TRAVEL_MODE", "driving")],
        )
        .unwrap();

        assert_eq!(config.mode, TravelMode::Walking);
        assert!(config.parallel_days);
        assert!(!config.segments);
    }

    #[test]
    fn test_days_flag_replaces_request_days() {
        let mut body = request(3);
        cli(&["--days", "2"]).apply_days(&mut body);
        assert_eq!(body.days, 2);

        let mut body = request(3);
        cli(&[]).apply_days(&mut body);
        assert_eq!(body.days, 3);
    }

    #[test]
    fn test_exit_status_for_rejected_request() {
        let cli = cli(&["--oracle", "haversine", "--days", "0"]);
        let assembler = config_for(&cli, &[]).unwrap().assembler().unwrap();
        let mut body = request(2);
        cli.apply_days(&mut body);

        let err = assembler.plan(&body).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidRequest(_)));
        assert_eq!(exit_status(&err), 2);
    }

    #[test]
    fn test_exit_status_for_planning_failure() {
        struct Broken;

        impl Partitioner for Broken {
            fn labels(&self, _coordinates: &[Coordinates], _k: usize) -> std::result::Result<Vec<usize>, PlannerError> {
                Err(PlannerError::ClusteringFailed("degenerate input".to_string()))
            }
        }

        let oracle = LocalOracle::new(HaversineMatrix::default());
        let assembler = ItineraryAssembler::with_parts(Clusterer::new(Broken), RouteSequencer::new(oracle));

        let err = assembler.plan(&request(2)).unwrap_err();
        assert!(matches!(err, PlannerError::ItineraryGenerationFailed(_)));
        assert_eq!(exit_status(&err), 1);
    }
}
