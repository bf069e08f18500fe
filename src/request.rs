//! Inbound request shape and validation.

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::geo_point::GeoPoint;

/// `{hotel, places, days}` as sent by an API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryRequest {
    pub hotel: GeoPoint,
    pub places: Vec<GeoPoint>,
    /// Signed so that non-positive values reach validation instead of
    /// failing deserialization.
    pub days: i64,
}

impl ItineraryRequest {
    pub fn new(hotel: GeoPoint, places: Vec<GeoPoint>, days: i64) -> Self {
        Self { hotel, places, days }
    }

    /// Checks the request and returns the day count.
    pub fn validate(&self) -> Result<usize, PlannerError> {
        let days = usize::try_from(self.days)
            .ok()
            .filter(|&days| days >= 1)
            .ok_or_else(|| PlannerError::InvalidRequest(format!("days must be at least 1, got {}", self.days)))?;
        validate_inputs(&self.hotel, &self.places, days)?;
        Ok(days)
    }
}

pub fn validate_inputs(base: &GeoPoint, points: &[GeoPoint], days: usize) -> Result<(), PlannerError> {
    if days == 0 {
        return Err(PlannerError::InvalidRequest("days must be at least 1".to_string()));
    }
    if points.is_empty() {
        return Err(PlannerError::InvalidRequest("at least one place is required".to_string()));
    }

    check_point("hotel", base)?;
    for (index, point) in points.iter().enumerate() {
        check_point(&format!("place {index}"), point)?;
    }

    Ok(())
}

fn check_point(what: &str, point: &GeoPoint) -> Result<(), PlannerError> {
    if point.name.trim().is_empty() {
        return Err(PlannerError::InvalidRequest(format!("{what} has an empty name")));
    }
    if !point.coordinates.in_range() {
        return Err(PlannerError::InvalidRequest(format!(
            "{what} '{}' has invalid coordinates ({}, {})",
            point.name, point.coordinates.lat, point.coordinates.lng
        )));
    }
    Ok(())
}
