//! Polyline representation for route geometries.
//!
//! Geometries are kept as decoded coordinate sequences. The compact encoded
//! polyline format is only handled at the boundary (directions responses).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::haversine::path_length_km;
use crate::registry::Coordinate;

/// Precision used by the directions service for encoded geometries.
pub const DEFAULT_PRECISION: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("invalid character at byte {0}")]
    InvalidCharacter(usize),
    #[error("encoded polyline ends mid-value")]
    Truncated,
    #[error("decoded point is outside valid coordinate range")]
    OutOfRange,
}

/// A polyline representing a route geometry as decoded coordinates.
///
/// Point order is the travel order and is never rearranged, so geometries
/// survive a round trip through track-file formats unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Straight segments origin -> stops (in order) -> origin.
    pub fn closed_circuit(origin: Coordinate, stops: &[Coordinate]) -> Self {
        let mut points = Vec::with_capacity(stops.len() + 2);
        points.push(origin);
        points.extend_from_slice(stops);
        points.push(origin);
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Great-circle length of the whole line.
    pub fn length_km(&self) -> f64 {
        path_length_km(&self.points)
    }

    /// Points as `[lon, lat]` pairs, the order GeoJSON and the directions API use.
    pub fn to_lon_lat(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| p.to_lon_lat()).collect()
    }

    /// Decodes an encoded polyline (`lat, lon` value pairs).
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, PolylineError> {
        let factor = 10f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut index = 0;
        let mut lat = 0i64;
        let mut lon = 0i64;
        let mut points = Vec::new();

        while index < bytes.len() {
            lat += next_value(bytes, &mut index)?;
            lon += next_value(bytes, &mut index)?;
            let point = Coordinate::new(lon as f64 / factor, lat as f64 / factor)
                .map_err(|_| PolylineError::OutOfRange)?;
            points.push(point);
        }

        Ok(Self { points })
    }

    pub fn encode(&self, precision: u32) -> String {
        let factor = 10f64.powi(precision as i32);
        let mut out = String::new();
        let mut prev_lat = 0i64;
        let mut prev_lon = 0i64;

        for point in &self.points {
            let lat = (point.lat() * factor).round() as i64;
            let lon = (point.lon() * factor).round() as i64;
            push_value(&mut out, lat - prev_lat);
            push_value(&mut out, lon - prev_lon);
            prev_lat = lat;
            prev_lon = lon;
        }

        out
    }
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result = 0i64;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::Truncated);
        };
        if !(63..=126).contains(&byte) || shift > 60 {
            return Err(PolylineError::InvalidCharacter(*index));
        }
        *index += 1;

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

fn push_value(out: &mut String, delta: i64) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= 0x20 {
        out.push(((0x20 | (value & 0x1f)) + 63) as u8 as char);
        value >>= 5;
    }
    out.push((value + 63) as u8 as char);
}
