//! Provider seams for distances and road routing.
//!
//! The planner only talks to the outside world through these traits, so tests
//! and callers can substitute their own sources.

use crate::directions::{DirectionsError, DirectionsRoute};
use crate::registry::Coordinate;

/// Provides a pairwise distance matrix (km) for a set of locations.
///
/// The matrix is indexed by the provided location order. An empty (or
/// mis-sized) matrix means "unavailable"; callers fall back to haversine.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<f64>>;
}

/// Resolves an ordered list of waypoints into a road route.
///
/// `waypoints` already contains the closing leg (it ends where it starts).
pub trait DirectionsProvider {
    fn route(&self, waypoints: &[Coordinate]) -> Result<DirectionsRoute, DirectionsError>;
}

impl<T: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for &T {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<f64>> {
        (**self).matrix_for(locations)
    }
}

impl<T: DirectionsProvider + ?Sized> DirectionsProvider for &T {
    fn route(&self, waypoints: &[Coordinate]) -> Result<DirectionsRoute, DirectionsError> {
        (**self).route(waypoints)
    }
}
