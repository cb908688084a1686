//! Stop ("lote") table for a collection point south of Salta, Argentina.
//!
//! Coordinates are (lon, lat). Stops sit on both sides of the origin so that
//! partitions are not trivially one-sided.

use lote_router::{Coordinate, CoordinateRegistry, VehicleSlot};

/// A named stop with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Lote {
    pub code: &'static str,
    pub lon: f64,
    pub lat: f64,
}

impl Lote {
    pub const fn new(code: &'static str, lon: f64, lat: f64) -> Self {
        Self { code, lon, lat }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lon, self.lat).expect("fixture coordinate")
    }
}

pub const ORIGIN: (f64, f64) = (-65.45, -24.90);

pub const LOTES: &[Lote] = &[
    Lote::new("A05", -65.40, -24.80),
    Lote::new("B10", -65.35, -24.85),
    Lote::new("C95", -65.50, -24.75),
    Lote::new("D12", -65.42, -24.95),
    Lote::new("E07", -65.55, -24.92),
    Lote::new("F33", -65.38, -24.98),
    Lote::new("G21", -65.47, -24.83),
    Lote::new("H02", -65.30, -24.90),
    Lote::new("J48", -65.58, -24.86),
    Lote::new("K15", -65.44, -25.02),
    Lote::new("L60", -65.52, -24.97),
    Lote::new("M09", -65.36, -24.78),
];

pub fn vehicles() -> [VehicleSlot; 2] {
    [
        VehicleSlot::new("Camion A", "AE123KD"),
        VehicleSlot::new("Camion B", "AF456JL"),
    ]
}

pub fn registry() -> CoordinateRegistry {
    let origin = Coordinate::new(ORIGIN.0, ORIGIN.1).expect("fixture origin");
    let mut registry = CoordinateRegistry::new(origin, vehicles());
    for lote in LOTES {
        registry.insert(lote.code, lote.coordinate()).expect("fixture stop");
    }
    registry
}

pub fn lote(code: &str) -> Lote {
    *LOTES
        .iter()
        .find(|lote| lote.code == code)
        .expect("fixture code")
}

/// All orderings of `items`, for brute-force comparisons.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}
