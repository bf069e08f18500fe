//! itinerary-planner
//!
//! Splits points of interest into day-sized groups around a base location and
//! orders each group into a round trip through a pluggable routing oracle.

pub mod error;
pub mod geo_point;
pub mod traits;
pub mod kmeans;
pub mod cluster;
pub mod polyline;
pub mod haversine;
pub mod local;
pub mod osrm;
pub mod google;
pub mod sequencer;
pub mod itinerary;
pub mod request;
pub mod config;

pub use cluster::{Cluster, Clusterer};
pub use error::{OracleError, PlannerError};
pub use geo_point::{Coordinates, GeoPoint};
pub use itinerary::{DayOutcome, DayPlan, Itinerary, ItineraryAssembler};
pub use request::ItineraryRequest;
pub use sequencer::{Route, RouteSegment, RouteSequencer};
pub use traits::{RoutingOracle, TravelMode};
