//! Exact closed-tour search for one vehicle.
//!
//! Tours start and end at matrix index 0 (the origin). Permutations are walked
//! in lexicographic order of the given stop list and a tour replaces the best
//! only when cheaper by more than [`TIE_EPSILON_KM`], so a tour and its mirror
//! image resolve the same way every run.

use serde::Serialize;

use crate::error::{PlanError, Result};

/// Cost differences below this count as ties.
pub const TIE_EPSILON_KM: f64 = 1e-9;

/// Most stops one circuit may hold; the search walks k! orders.
pub const MAX_CIRCUIT_STOPS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circuit {
    /// Matrix indices in visiting order, origin excluded.
    pub order: Vec<usize>,
    /// Closed-tour length origin -> order -> origin.
    pub cost: f64,
}

impl Circuit {
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Length of origin -> `order` -> origin under `matrix`.
pub fn tour_cost(matrix: &[Vec<f64>], order: &[usize]) -> f64 {
    let mut cost = 0.0;
    let mut prev = 0;
    for &next in order {
        cost += matrix[prev][next];
        prev = next;
    }
    if !order.is_empty() {
        cost += matrix[prev][0];
    }
    cost
}

/// Returns the cheapest visiting order of `stops` (matrix indices, all > 0).
///
/// An empty `stops` yields an empty, zero-cost circuit. More than
/// [`MAX_CIRCUIT_STOPS`] stops is rejected without searching.
pub fn solve_circuit(matrix: &[Vec<f64>], stops: &[usize]) -> Result<Circuit> {
    if stops.len() > MAX_CIRCUIT_STOPS {
        return Err(PlanError::TooManyStops {
            count: stops.len(),
            max: MAX_CIRCUIT_STOPS,
        });
    }
    if stops.is_empty() {
        return Ok(Circuit {
            order: Vec::new(),
            cost: 0.0,
        });
    }

    let mut positions: Vec<usize> = (0..stops.len()).collect();
    let mut candidate: Vec<usize> = stops.to_vec();
    let mut best = Circuit {
        cost: tour_cost(matrix, &candidate),
        order: candidate.clone(),
    };

    while next_permutation(&mut positions) {
        for (slot, &pos) in candidate.iter_mut().zip(&positions) {
            *slot = stops[pos];
        }
        let cost = tour_cost(matrix, &candidate);
        if cost < best.cost - TIE_EPSILON_KM {
            best.cost = cost;
            best.order.copy_from_slice(&candidate);
        }
    }

    Ok(best)
}

/// Advances `items` to the next lexicographic permutation; false once exhausted.
fn next_permutation(items: &mut [usize]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let Some(pivot) = (0..items.len() - 1).rev().find(|&i| items[i] < items[i + 1]) else {
        return false;
    };
    let Some(successor) = (pivot + 1..items.len())
        .rev()
        .find(|&j| items[j] > items[pivot])
    else {
        return false;
    };
    items.swap(pivot, successor);
    items[pivot + 1..].reverse();
    true
}
