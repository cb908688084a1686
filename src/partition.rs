//! Two-way split of the selected stops between the vehicles.
//!
//! Every split with both groups non-empty is scored; input is capped at a
//! handful of stops so exhaustive search stays in the low hundreds.
//!
//! Objective: for each group, the sum of each stop's haversine distance to the
//! group centroid, added over both groups. Ties (within [`TIE_EPSILON_KM`]) go to
//! the split with the smaller size difference, then to the lexicographically
//! smaller code list of group A. Group A always holds the smallest code.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::circuit::MAX_CIRCUIT_STOPS;
use crate::error::{PlanError, Result};
use crate::haversine::haversine_km;
use crate::registry::{Coordinate, Stop, StopCode};

/// Objective differences below this are treated as ties.
pub const TIE_EPSILON_KM: f64 = 1e-9;

/// Largest input the exhaustive search accepts; matches the circuit bound.
pub const MAX_PARTITION_STOPS: usize = MAX_CIRCUIT_STOPS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    pub group_a: Vec<Stop>,
    pub group_b: Vec<Stop>,
    /// Minimized objective value (km).
    pub grouping_km: f64,
}

struct Candidate {
    mask: u32,
    cost: f64,
    size_diff: usize,
    codes_a: Vec<StopCode>,
}

impl Candidate {
    fn better_than(&self, other: &Candidate) -> bool {
        if (self.cost - other.cost).abs() > TIE_EPSILON_KM {
            return self.cost < other.cost;
        }
        match self.size_diff.cmp(&other.size_diff) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => self.codes_a < other.codes_a,
        }
    }
}

/// Splits `stops` into two disjoint, non-empty groups minimizing the centroid objective.
pub fn partition_stops(stops: &[Stop]) -> Result<Partition> {
    if stops.len() < 2 {
        return Err(PlanError::TooFewStops {
            valid: stops.len(),
            min: 2,
        });
    }
    if stops.len() > MAX_PARTITION_STOPS {
        return Err(PlanError::TooManyStops {
            count: stops.len(),
            max: MAX_PARTITION_STOPS,
        });
    }

    let mut sorted = stops.to_vec();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));
    if sorted.windows(2).any(|pair| pair[0].code == pair[1].code) {
        return Err(PlanError::internal("duplicate stop passed to partitioner"));
    }

    let n = sorted.len();
    // Stop 0 is pinned to group A; bit i of `mask` puts stop i + 1 in A as well.
    let free_bits = n - 1;
    let all_in_a = (1u32 << free_bits) - 1;

    let mut best: Option<Candidate> = None;
    for mask in 0..all_in_a {
        let (a, b) = split(&sorted, mask);
        let candidate = Candidate {
            mask,
            cost: centroid_cost(&a) + centroid_cost(&b),
            size_diff: a.len().abs_diff(b.len()),
            codes_a: a.iter().map(|stop| stop.code.clone()).collect(),
        };
        if best.as_ref().is_none_or(|current| candidate.better_than(current)) {
            best = Some(candidate);
        }
    }

    let best = best.ok_or_else(|| PlanError::internal("no candidate split evaluated"))?;
    let (group_a, group_b) = split(&sorted, best.mask);
    debug!(
        group_a = ?best.codes_a,
        group_b = group_b.len(),
        grouping_km = best.cost,
        "selected partition"
    );

    Ok(Partition {
        group_a: group_a.into_iter().cloned().collect(),
        group_b: group_b.into_iter().cloned().collect(),
        grouping_km: best.cost,
    })
}

fn split(sorted: &[Stop], mask: u32) -> (Vec<&Stop>, Vec<&Stop>) {
    let mut a = vec![&sorted[0]];
    let mut b = Vec::new();
    for (i, stop) in sorted.iter().enumerate().skip(1) {
        if mask & (1 << (i - 1)) != 0 {
            a.push(stop);
        } else {
            b.push(stop);
        }
    }
    (a, b)
}

/// Arithmetic mean of the member coordinates.
///
/// Adequate for the few-kilometre spread of a delivery area.
pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lon = points.iter().map(|p| p.lon()).sum::<f64>() / n;
    let lat = points.iter().map(|p| p.lat()).sum::<f64>() / n;
    Coordinate::new(lon, lat).ok()
}

fn centroid_cost(group: &[&Stop]) -> f64 {
    let points: Vec<Coordinate> = group.iter().map(|stop| stop.coordinate).collect();
    match centroid(&points) {
        Some(center) => points.iter().map(|p| haversine_km(*p, center)).sum(),
        None => 0.0,
    }
}
