//! Polyline representation for route geometries.
//!
//! Segments carry geometry in the compact encoded polyline format (precision
//! 5) used by both OSRM and Google. This type holds the decoded coordinates
//! and converts at the boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo_point::Coordinates;

const PRECISION: f64 = 1e5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    /// The string ended in the middle of a value.
    #[error("truncated polyline at byte {0}")]
    Truncated(usize),

    /// A byte outside the encoding alphabet.
    #[error("invalid polyline byte {byte:#04x} at {position}")]
    InvalidByte { position: usize, byte: u8 },

    /// A value spans more chunks than fit in 32 bits.
    #[error("polyline value overflow at byte {0}")]
    Overflow(usize),
}

/// A polyline as decoded (latitude, longitude) points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    ///
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// A two-point straight line.
    pub fn straight(from: Coordinates, to: Coordinates) -> Self {
        Self::new(vec![from.as_tuple(), to.as_tuple()])
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    /// Encodes the points with the polyline algorithm at precision 5.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let (mut prev_lat, mut prev_lng) = (0i64, 0i64);

        for &(lat, lng) in &self.points {
            let lat = (lat * PRECISION).round() as i64;
            let lng = (lng * PRECISION).round() as i64;
            encode_value(lat - prev_lat, &mut out);
            encode_value(lng - prev_lng, &mut out);
            prev_lat = lat;
            prev_lng = lng;
        }

        out
    }

    /// Decodes an encoded polyline string.
    pub fn decode(encoded: &str) -> Result<Self, PolylineError> {
        let bytes = encoded.as_bytes();
        let mut position = 0;
        let mut points = Vec::new();
        let (mut lat, mut lng) = (0i64, 0i64);

        while position < bytes.len() {
            lat += decode_value(bytes, &mut position)?;
            if position >= bytes.len() {
                return Err(PolylineError::Truncated(position));
            }
            lng += decode_value(bytes, &mut position)?;
            points.push((lat as f64 / PRECISION, lng as f64 / PRECISION));
        }

        Ok(Self { points })
    }
}

fn encode_value(value: i64, out: &mut String) {
    let mut shifted = if value < 0 { !(value << 1) } else { value << 1 };
    while shifted >= 0x20 {
        out.push(char::from((0x20 | (shifted & 0x1f)) as u8 + 63));
        shifted >>= 5;
    }
    out.push(char::from(shifted as u8 + 63));
}

fn decode_value(bytes: &[u8], position: &mut usize) -> Result<i64, PolylineError> {
    let mut result = 0i64;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*position) else {
            return Err(PolylineError::Truncated(*position));
        };
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidByte {
                position: *position,
                byte,
            });
        }
        if shift > 30 {
            return Err(PolylineError::Overflow(*position));
        }

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        *position += 1;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}
