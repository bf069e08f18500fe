//! Real Bangkok locations used as the reference scenario.

use itinerary_planner::GeoPoint;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.name, self.lat, self.lng)
    }
}

pub const HOTEL: Location = Location::new("Hotel", 13.7285038, 100.5656622);

pub const PLACES: &[Location] = &[
    Location::new("Little Zoo Café", 13.7113324, 100.6060409),
    Location::new("Cielo Sky Bar", 13.7092345, 100.5975182),
    Location::new("Masaru Anime", 13.713339, 100.5920146),
    Location::new("Dasa Book Cafe", 13.7251661, 100.5756152),
    Location::new("Safari World", 13.7635309, 100.633975),
    Location::new("Central Village", 13.7242318, 100.585675),
    Location::new("DJ Plus", 13.7362187, 100.5560414),
    Location::new("Mega Plaza", 13.7355117, 100.5278661),
    Location::new("Decommune", 13.7465174, 100.5043625),
];

pub fn hotel() -> GeoPoint {
    HOTEL.point()
}

pub fn places() -> Vec<GeoPoint> {
    PLACES.iter().map(Location::point).collect()
}

/// Sorted names, for comparing groups regardless of order.
pub fn sorted_names<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Vec<String> {
    let mut names: Vec<String> = points.into_iter().map(|p| p.name.clone()).collect();
    names.sort();
    names
}
