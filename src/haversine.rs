//! Haversine distance matrix provider (fallback when no routing service is
//! reachable).
//!
//! Uses great-circle distance to estimate travel time.
//! Less accurate than a road network but always available.

use crate::geo_point::Coordinates;
use crate::traits::{DistanceMatrixProvider, TravelMode};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Haversine-based distance matrix provider.
///
/// Estimates travel time in seconds from straight-line distance and an
/// assumed speed.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self::for_mode(TravelMode::Driving)
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Typical urban speeds per travel mode.
    pub fn for_mode(mode: TravelMode) -> Self {
        let speed_kmh = match mode {
            TravelMode::Driving => 40.0,
            TravelMode::Cycling => 15.0,
            TravelMode::Walking => 5.0,
        };
        Self { speed_kmh }
    }

    /// Convert distance in km to travel time in seconds.
    fn km_to_seconds(&self, km: f64) -> f64 {
        km / self.speed_kmh * 3600.0
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[Coordinates]) -> Vec<Vec<f64>> {
        let n = locations.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    matrix[i][j] = self.km_to_seconds(haversine_km(*from, *to));
                }
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let p = Coordinates::new(13.7285, 100.5657);
        assert!(haversine_km(p, p) < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Bangkok (13.7563, 100.5018) to Chiang Mai (18.7883, 98.9853)
        // Actual distance ~580 km
        let dist = haversine_km(Coordinates::new(13.7563, 100.5018), Coordinates::new(18.7883, 98.9853));
        assert!(dist > 560.0 && dist < 600.0, "Bangkok to Chiang Mai should be ~580km, got {}", dist);
    }

    #[test]
    fn test_matrix_diagonal_is_zero_and_symmetric() {
        let provider = HaversineMatrix::default();
        let locations = vec![
            Coordinates::new(13.71, 100.60),
            Coordinates::new(13.72, 100.58),
            Coordinates::new(13.74, 100.50),
        ];
        let matrix = provider.matrix_for(&locations);

        for i in 0..locations.len() {
            assert_eq!(matrix[i][i], 0.0, "Diagonal should be zero");
        }
        assert_eq!(matrix[0][2], matrix[2][0], "Matrix should be symmetric");
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = HaversineMatrix::new(40.0);
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        assert!((provider.km_to_seconds(10.0) - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_walking_is_slower_than_driving() {
        let a = Coordinates::new(13.71, 100.60);
        let b = Coordinates::new(13.74, 100.50);
        let walk = HaversineMatrix::for_mode(TravelMode::Walking).matrix_for(&[a, b]);
        let drive = HaversineMatrix::for_mode(TravelMode::Driving).matrix_for(&[a, b]);
        assert!(walk[0][1] > drive[0][1]);
    }
}
