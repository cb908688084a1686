//! Static coordinate table: stop codes, the collection point and the vehicle roster.
//!
//! The registry is built once (in code or from JSON) and handed to the planner
//! by value. Nothing in it changes after construction.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// A (longitude, latitude) pair in decimal degrees.
///
/// Serialized as a `[lon, lat]` array, the order used by the directions service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    lon: f64,
    lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        let in_range = lon.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lon)
            && (-90.0..=90.0).contains(&lat);
        if !in_range {
            return Err(PlanError::InvalidCoordinate { lon, lat });
        }
        Ok(Self { lon, lat })
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = PlanError;

    fn try_from([lon, lat]: [f64; 2]) -> Result<Self> {
        Coordinate::new(lon, lat)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        coord.to_lon_lat()
    }
}

/// Normalized stop ("lote") code: trimmed and uppercased, never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopCode(String);

impl StopCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() || !code.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return Err(PlanError::InvalidStopCode(raw.to_string()));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopCode {
    type Error = PlanError;

    fn try_from(raw: String) -> Result<Self> {
        StopCode::parse(&raw)
    }
}

impl From<StopCode> for String {
    fn from(code: StopCode) -> Self {
        code.0
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one of the two delivery vehicles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleSlot {
    pub name: String,
    pub plate: String,
}

impl VehicleSlot {
    pub fn new(name: impl Into<String>, plate: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plate: plate.into(),
        }
    }
}

/// A registered stop with its location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub code: StopCode,
    pub coordinate: Coordinate,
}

/// Outcome of checking user input against the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StopSelection {
    /// Known stops, deduplicated, in first-seen order.
    pub valid: Vec<Stop>,
    /// Raw inputs that are malformed or not registered.
    pub invalid: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CoordinateRegistry {
    origin: Coordinate,
    vehicles: [VehicleSlot; 2],
    stops: BTreeMap<StopCode, Coordinate>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    origin: Coordinate,
    vehicles: [VehicleSlot; 2],
    #[serde(default)]
    stops: BTreeMap<String, Coordinate>,
}

impl CoordinateRegistry {
    pub fn new(origin: Coordinate, vehicles: [VehicleSlot; 2]) -> Self {
        Self {
            origin,
            vehicles,
            stops: BTreeMap::new(),
        }
    }

    /// Builder-style registration; fails on malformed or duplicate codes.
    pub fn with_stop(mut self, code: &str, lon: f64, lat: f64) -> Result<Self> {
        self.insert(code, Coordinate::new(lon, lat)?)?;
        Ok(self)
    }

    pub fn insert(&mut self, code: &str, coordinate: Coordinate) -> Result<()> {
        let code = StopCode::parse(code)?;
        if self.stops.contains_key(&code) {
            return Err(PlanError::DuplicateStop(code));
        }
        self.stops.insert(code, coordinate);
        Ok(())
    }

    /// Loads `{ "origin": [lon, lat], "vehicles": [..2], "stops": { "A05": [lon, lat] } }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: RegistryFile =
            serde_json::from_str(json).map_err(|err| PlanError::config(err.to_string()))?;

        let mut registry = Self::new(file.origin, file.vehicles);
        for (code, coordinate) in file.stops {
            registry.insert(&code, coordinate)?;
        }
        Ok(registry)
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn vehicles(&self) -> &[VehicleSlot; 2] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Looks up a raw (unnormalized) code.
    pub fn lookup(&self, code: &str) -> Option<Coordinate> {
        let code = StopCode::parse(code).ok()?;
        self.stops.get(&code).copied()
    }

    pub fn codes(&self) -> impl Iterator<Item = &StopCode> {
        self.stops.keys()
    }

    /// Normalizes, deduplicates and splits the input into known and unknown codes.
    pub fn validate<S: AsRef<str>>(&self, codes: &[S]) -> StopSelection {
        let mut seen = HashSet::new();
        let mut selection = StopSelection::default();

        for raw in codes {
            let raw = raw.as_ref();
            match StopCode::parse(raw) {
                Ok(code) => {
                    if !seen.insert(code.clone()) {
                        continue;
                    }
                    match self.stops.get(&code) {
                        Some(coordinate) => selection.valid.push(Stop {
                            code,
                            coordinate: *coordinate,
                        }),
                        None => selection.invalid.push(code.to_string()),
                    }
                }
                Err(_) => {
                    if !raw.trim().is_empty() {
                        selection.invalid.push(raw.to_string());
                    }
                }
            }
        }

        selection
    }
}
