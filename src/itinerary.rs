//! Day-by-day itinerary assembly.

use rayon::prelude::*;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{info, warn};

use crate::cluster::{Cluster, Clusterer};
use crate::error::PlannerError;
use crate::geo_point::GeoPoint;
use crate::kmeans::KMeans;
use crate::request::{ItineraryRequest, validate_inputs};
use crate::sequencer::{Route, RouteSegment, RouteSequencer};
use crate::traits::{Partitioner, RoutingOracle};

/// Route and segment geometry of one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayPlan {
    pub route: Route,
    #[serde(rename = "routeSegments")]
    pub segments: Vec<RouteSegment>,
}

/// Result of sequencing one day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    Planned(DayPlan),
    /// The day keeps its slot but has no route.
    Failed(PlannerError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryDay {
    /// 1-based day number.
    pub day: usize,
    pub cluster: Cluster,
    pub outcome: DayOutcome,
}

impl ItineraryDay {
    pub fn label(&self) -> String {
        day_label(self.day)
    }

    /// The day's plan, or `None` if sequencing failed.
    pub fn plan(&self) -> Option<&DayPlan> {
        match &self.outcome {
            DayOutcome::Planned(plan) => Some(plan),
            DayOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PlannerError> {
        match &self.outcome {
            DayOutcome::Planned(_) => None,
            DayOutcome::Failed(err) => Some(err),
        }
    }
}

pub fn day_label(day: usize) -> String {
    format!("Day {day}")
}

/// Days in increasing order, labelled `"Day 1"`, `"Day 2"`, ...
///
/// Serializes as a map from label to `{route, routeSegments}`; failed days
/// appear with both lists empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Itinerary {
    days: Vec<ItineraryDay>,
}

impl Itinerary {
    pub fn days(&self) -> &[ItineraryDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.days.iter().map(ItineraryDay::label).collect()
    }

    /// Looks a day up by its label, e.g. `"Day 2"`.
    pub fn get(&self, label: &str) -> Option<&ItineraryDay> {
        self.days.iter().find(|day| day.label() == label)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItineraryDay> {
        self.days.iter().filter(|day| day.error().is_some())
    }
}

impl Serialize for Itinerary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let empty = DayPlan::default();
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for day in &self.days {
            map.serialize_entry(&day.label(), day.plan().unwrap_or(&empty))?;
        }
        map.end()
    }
}

/// Drives clustering and per-day sequencing.
#[derive(Debug, Clone)]
pub struct ItineraryAssembler<O, P = KMeans> {
    clusterer: Clusterer<P>,
    sequencer: RouteSequencer<O>,
    parallel: bool,
}

impl<O: RoutingOracle> ItineraryAssembler<O, KMeans> {
    pub fn new(oracle: O) -> Self {
        Self::with_parts(Clusterer::default(), RouteSequencer::new(oracle))
    }
}

impl<O: RoutingOracle, P: Partitioner> ItineraryAssembler<O, P> {
    pub fn with_parts(clusterer: Clusterer<P>, sequencer: RouteSequencer<O>) -> Self {
        Self {
            clusterer,
            sequencer,
            parallel: false,
        }
    }

    /// Sequence days concurrently. Output order is unchanged.
    pub fn with_parallel_days(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl<O: RoutingOracle + Sync, P: Partitioner> ItineraryAssembler<O, P> {
    /// Validates `request`, then builds its itinerary.
    pub fn plan(&self, request: &ItineraryRequest) -> Result<Itinerary, PlannerError> {
        let days = request.validate()?;
        self.build(&request.hotel, &request.places, days)
    }

    /// Splits `points` into `days` groups around `base` and orders each one.
    ///
    /// A day whose sequencing fails stays in the itinerary with
    /// [`DayOutcome::Failed`]. Clustering failure fails the whole build with
    /// [`PlannerError::ItineraryGenerationFailed`].
    pub fn build(&self, base: &GeoPoint, points: &[GeoPoint], days: usize) -> Result<Itinerary, PlannerError> {
        validate_inputs(base, points, days)?;
        info!(days, points = points.len(), "starting itinerary generation");

        let clusters = self
            .clusterer
            .partition(base, points, days)
            .map_err(|err| PlannerError::ItineraryGenerationFailed(Box::new(err)))?;

        let sequencer = &self.sequencer;
        let days: Vec<ItineraryDay> = if self.parallel {
            clusters
                .into_par_iter()
                .enumerate()
                .map(|(index, cluster)| plan_day(sequencer, base, index + 1, cluster))
                .collect()
        } else {
            clusters
                .into_iter()
                .enumerate()
                .map(|(index, cluster)| plan_day(sequencer, base, index + 1, cluster))
                .collect()
        };

        let itinerary = Itinerary { days };
        info!(
            days = itinerary.len(),
            failed = itinerary.failures().count(),
            "itinerary generation complete"
        );
        Ok(itinerary)
    }
}

fn plan_day<O: RoutingOracle>(sequencer: &RouteSequencer<O>, base: &GeoPoint, day: usize, cluster: Cluster) -> ItineraryDay {
    info!(day, stops = cluster.len(), "generating itinerary for day");

    let outcome = match sequencer.sequence(base, &cluster) {
        Ok((route, segments)) => DayOutcome::Planned(DayPlan { route, segments }),
        Err(source) => {
            let err = PlannerError::sequencing(day, source);
            warn!(day, error = %err, "day left without a route");
            DayOutcome::Failed(err)
        }
    };

    ItineraryDay { day, cluster, outcome }
}
