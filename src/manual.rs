//! Caller-driven replacement of a fallback geometry.
//!
//! When the directions service failed, a user can fetch the route elsewhere and
//! paste the JSON back. Accepted payloads: a directions response
//! (`routes[0]`) or a GeoJSON `FeatureCollection` whose first feature is the
//! route line. Nothing here calls the network.

use serde::Deserialize;
use thiserror::Error;

use crate::directions::{GeometryPayload, RouteResponse, RouteSummary};
use crate::resolver::{GeometrySource, ResolvedRoute};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideError {
    #[error("route came from the directions service; nothing to override")]
    NotFallback,
    #[error("override payload is not valid route JSON: {0}")]
    Parse(String),
    #[error("override payload contains no route geometry")]
    NoGeometry,
    #[error("override geometry is invalid: {0}")]
    Geometry(String),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<GeometryPayload>,
    #[serde(default)]
    properties: Option<FeatureProperties>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    summary: Option<RouteSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OverridePayload {
    // `routes` defaults to empty, so the stricter GeoJSON shape is tried first.
    GeoJson(FeatureCollection),
    Directions(RouteResponse),
}

/// Replaces the geometry of a fallback route with pasted route JSON.
///
/// The payload's own distance is used when present, otherwise the length of
/// the supplied line.
pub fn apply_manual_override(
    route: &ResolvedRoute,
    payload: &str,
) -> Result<ResolvedRoute, OverrideError> {
    if route.source != GeometrySource::EmergencyFallback {
        return Err(OverrideError::NotFallback);
    }

    let parsed: OverridePayload =
        serde_json::from_str(payload).map_err(|err| OverrideError::Parse(err.to_string()))?;

    let (geometry, distance) = match parsed {
        OverridePayload::GeoJson(collection) => {
            let feature = collection
                .features
                .into_iter()
                .next()
                .ok_or(OverrideError::NoGeometry)?;
            let distance = feature
                .properties
                .and_then(|props| props.summary)
                .and_then(|summary| summary.distance);
            (feature.geometry, distance)
        }
        OverridePayload::Directions(response) => {
            let body = response
                .routes
                .into_iter()
                .next()
                .ok_or(OverrideError::NoGeometry)?;
            (body.geometry, body.summary.and_then(|summary| summary.distance))
        }
    };

    let path = geometry
        .ok_or(OverrideError::NoGeometry)?
        .into_polyline()
        .map_err(OverrideError::Geometry)?;
    if path.len() < 2 {
        return Err(OverrideError::NoGeometry);
    }

    let distance_km = distance
        .filter(|km| km.is_finite() && *km >= 0.0)
        .unwrap_or_else(|| path.length_km());

    Ok(ResolvedRoute {
        distance_km,
        path,
        source: GeometrySource::ManualOverride,
        fallback_reason: route.fallback_reason.clone(),
    })
}
