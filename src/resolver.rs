//! Road distance and geometry for an ordered circuit, with straight-line fallback.
//!
//! One request per vehicle per solve. Any failure (no key, timeout, HTTP error,
//! unusable body) becomes an emergency geometry built from haversine legs; the
//! failure text is kept on the result for display.

use serde::Serialize;
use tracing::{debug, warn};

use crate::directions::{DirectionsError, DirectionsRoute};
use crate::polyline::Polyline;
use crate::registry::Coordinate;
use crate::traits::DirectionsProvider;

/// Where a route's distance and geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeometrySource {
    ExternalService,
    EmergencyFallback,
    /// Fallback geometry later replaced by caller-supplied data.
    ManualOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRoute {
    pub distance_km: f64,
    pub path: Polyline,
    pub source: GeometrySource,
    /// Failure that forced the fallback, if any.
    pub fallback_reason: Option<String>,
}

impl ResolvedRoute {
    pub fn is_fallback(&self) -> bool {
        self.source == GeometrySource::EmergencyFallback
    }
}

/// Result of the single external attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    External(DirectionsRoute),
    Failed(DirectionsError),
}

/// Origin, the stops in order, then the origin again.
pub fn circuit_waypoints(origin: Coordinate, stops: &[Coordinate]) -> Vec<Coordinate> {
    Polyline::closed_circuit(origin, stops).into_points()
}

pub fn attempt<D>(provider: &D, origin: Coordinate, stops: &[Coordinate]) -> Resolution
where
    D: DirectionsProvider + ?Sized,
{
    if stops.is_empty() {
        return Resolution::Failed(DirectionsError::EmptyRoute);
    }
    match provider.route(&circuit_waypoints(origin, stops)) {
        Ok(route) => Resolution::External(route),
        Err(err) => Resolution::Failed(err),
    }
}

/// Resolves the closed circuit; never fails.
pub fn resolve_route<D>(provider: &D, origin: Coordinate, stops: &[Coordinate]) -> ResolvedRoute
where
    D: DirectionsProvider + ?Sized,
{
    match attempt(provider, origin, stops) {
        Resolution::External(route) => {
            debug!(
                distance_km = route.distance_km,
                points = route.path.len(),
                "directions resolved"
            );
            ResolvedRoute {
                distance_km: route.distance_km,
                path: route.path,
                source: GeometrySource::ExternalService,
                fallback_reason: None,
            }
        }
        Resolution::Failed(err) => {
            warn!(
                error = %err,
                stops = stops.len(),
                "directions unavailable, using straight-line route"
            );
            emergency_route(origin, stops, &err)
        }
    }
}

/// Straight segments through the stops; distance is the sum of haversine legs.
pub fn emergency_route(
    origin: Coordinate,
    stops: &[Coordinate],
    reason: &DirectionsError,
) -> ResolvedRoute {
    let path = Polyline::closed_circuit(origin, stops);
    ResolvedRoute {
        distance_km: path.length_km(),
        path,
        source: GeometrySource::EmergencyFallback,
        fallback_reason: Some(reason.to_string()),
    }
}
