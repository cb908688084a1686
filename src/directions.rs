//! Directions-service HTTP adapter (openrouteservice-style API).
//!
//! Routes are requested with `POST {route_path}` and a body of
//! `{ "coordinates": [[lon, lat], ...], "units": "km" }`; the response's
//! `routes[0].summary.distance` and `routes[0].geometry` are read back.
//! The same client can serve a road-distance matrix from `{matrix_path}`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::polyline::{DEFAULT_PRECISION, Polyline};
use crate::registry::Coordinate;
use crate::traits::{DirectionsProvider, DistanceMatrixProvider};

/// Why a directions request produced no usable route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectionsError {
    #[error("no API key configured for the directions service")]
    MissingApiKey,
    #[error("directions service rejected the API key (HTTP {0})")]
    Unauthorized(u16),
    #[error("directions request timed out")]
    Timeout,
    #[error("directions service returned HTTP {0}")]
    Status(u16),
    #[error("directions request failed: {0}")]
    Transport(String),
    #[error("malformed directions response: {0}")]
    Malformed(String),
    #[error("directions service found no route between the points")]
    EmptyRoute,
}

impl From<reqwest::Error> for DirectionsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DirectionsError::Timeout
        } else if err.is_decode() {
            DirectionsError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            DirectionsError::Status(status.as_u16())
        } else {
            DirectionsError::Transport(err.to_string())
        }
    }
}

/// Where the API key travels on each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPlacement {
    Header { name: String },
    Query { param: String },
}

impl Default for AuthPlacement {
    fn default() -> Self {
        AuthPlacement::Header {
            name: "Authorization".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    pub base_url: String,
    pub profile: String,
    /// Path of the route endpoint; `{profile}` is substituted.
    pub route_path: String,
    /// Path of the matrix endpoint; `{profile}` is substituted.
    pub matrix_path: String,
    pub api_key: Option<String>,
    pub auth: AuthPlacement,
    pub timeout_secs: u64,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            profile: "driving-car".to_string(),
            route_path: "/v2/directions/{profile}/json".to_string(),
            matrix_path: "/v2/matrix/{profile}".to_string(),
            api_key: None,
            auth: AuthPlacement::default(),
            timeout_secs: 30,
        }
    }
}

impl DirectionsConfig {
    /// Reads `ROUTING_BASE_URL`, `ROUTING_API_KEY`, `ROUTING_PROFILE` and
    /// `ROUTING_TIMEOUT_SECS`; anything unset keeps its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(base_url) = lookup("ROUTING_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(profile) = lookup("ROUTING_PROFILE") {
            config.profile = profile;
        }
        config.api_key = lookup("ROUTING_API_KEY").filter(|key| !key.trim().is_empty());
        if let Some(timeout) =
            lookup("ROUTING_TIMEOUT_SECS").and_then(|raw| raw.trim().parse().ok())
        {
            config.timeout_secs = timeout;
        }
        config
    }

    pub fn route_url(&self) -> String {
        self.url_for(&self.route_path)
    }

    pub fn matrix_url(&self) -> String {
        self.url_for(&self.matrix_path)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.replace("{profile}", &self.profile))
    }
}

/// Road distance and geometry for one closed route.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRoute {
    pub distance_km: f64,
    pub path: Polyline,
}

#[derive(Debug, Clone)]
pub struct DirectionsClient {
    config: DirectionsConfig,
    client: reqwest::blocking::Client,
}

impl DirectionsClient {
    pub fn new(config: DirectionsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &DirectionsConfig {
        &self.config
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, DirectionsError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(DirectionsError::MissingApiKey)?;

        let mut request = self.client.post(url).json(body);
        request = match &self.config.auth {
            AuthPlacement::Header { name } => request.header(name.as_str(), key),
            AuthPlacement::Query { param } => request.query(&[(param.as_str(), key)]),
        };

        let response = request.send()?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(DirectionsError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(DirectionsError::Status(status.as_u16()));
        }

        Ok(response.json::<T>()?)
    }
}

impl DirectionsProvider for DirectionsClient {
    fn route(&self, waypoints: &[Coordinate]) -> Result<DirectionsRoute, DirectionsError> {
        if waypoints.len() < 2 {
            return Err(DirectionsError::EmptyRoute);
        }

        let coordinates: Vec<[f64; 2]> = waypoints.iter().map(|p| p.to_lon_lat()).collect();
        let body = RouteRequest {
            coordinates: &coordinates,
            units: "km",
        };
        debug!(waypoints = coordinates.len(), "requesting directions");

        let response: RouteResponse = self.post(self.config.route_url(), &body)?;
        route_from_response(response)
    }
}

impl DistanceMatrixProvider for DirectionsClient {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<f64>> {
        if locations.is_empty() {
            return Vec::new();
        }

        let coordinates: Vec<[f64; 2]> = locations.iter().map(|p| p.to_lon_lat()).collect();
        let body = MatrixRequest {
            locations: &coordinates,
            metrics: &["distance"],
            units: "km",
        };

        match self.post::<_, MatrixResponse>(self.config.matrix_url(), &body) {
            Ok(response) => matrix_from_response(response, locations.len()),
            Err(err) => {
                debug!(error = %err, "road distance matrix unavailable");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct RouteRequest<'a> {
    coordinates: &'a [[f64; 2]],
    units: &'static str,
}

#[derive(Debug, Serialize)]
struct MatrixRequest<'a> {
    locations: &'a [[f64; 2]],
    metrics: &'static [&'static str],
    units: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteResponse {
    #[serde(default)]
    pub(crate) routes: Vec<RouteBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteBody {
    #[serde(default)]
    pub(crate) summary: Option<RouteSummary>,
    #[serde(default)]
    pub(crate) geometry: Option<GeometryPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteSummary {
    #[serde(default)]
    pub(crate) distance: Option<f64>,
}

/// Route geometry either as an encoded polyline or as a coordinate list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum GeometryPayload {
    Encoded(String),
    LineString { coordinates: Vec<Vec<f64>> },
}

impl GeometryPayload {
    pub(crate) fn into_polyline(self) -> Result<Polyline, String> {
        match self {
            GeometryPayload::Encoded(encoded) => {
                Polyline::decode(&encoded, DEFAULT_PRECISION).map_err(|err| err.to_string())
            }
            GeometryPayload::LineString { coordinates } => {
                let points = coordinates
                    .into_iter()
                    .map(|pair| match pair.as_slice() {
                        [lon, lat, ..] => {
                            Coordinate::new(*lon, *lat).map_err(|err| err.to_string())
                        }
                        _ => Err("geometry position needs lon and lat".to_string()),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Polyline::new(points))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    distances: Option<Vec<Vec<Option<f64>>>>,
}

pub(crate) fn route_from_response(
    response: RouteResponse,
) -> Result<DirectionsRoute, DirectionsError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(DirectionsError::EmptyRoute)?;

    let distance_km = route
        .summary
        .and_then(|summary| summary.distance)
        .ok_or_else(|| DirectionsError::Malformed("route summary has no distance".to_string()))?;
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(DirectionsError::Malformed(format!("invalid distance {distance_km}")));
    }

    let path = route
        .geometry
        .ok_or(DirectionsError::EmptyRoute)?
        .into_polyline()
        .map_err(DirectionsError::Malformed)?;
    if path.len() < 2 {
        return Err(DirectionsError::EmptyRoute);
    }

    Ok(DirectionsRoute { distance_km, path })
}

fn matrix_from_response(response: MatrixResponse, size: usize) -> Vec<Vec<f64>> {
    let Some(rows) = response.distances else {
        return Vec::new();
    };
    if rows.len() != size || rows.iter().any(|row| row.len() != size) {
        return Vec::new();
    }

    let mut matrix = Vec::with_capacity(size);
    for row in rows {
        // A null cell means no road connection; the whole matrix is unusable then.
        let Some(row) = row.into_iter().collect::<Option<Vec<f64>>>() else {
            return Vec::new();
        };
        matrix.push(row);
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<DirectionsRoute, DirectionsError> {
        route_from_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn parses_coordinate_geometry() {
        let route = parse(
            r#"{"routes":[{"summary":{"distance":12.5,"duration":900},
                "geometry":{"type":"LineString",
                "coordinates":[[-65.45,-24.9],[-65.4,-24.8,1180.0],[-65.45,-24.9]]}}]}"#,
        )
        .unwrap();
        assert_eq!(route.distance_km, 12.5);
        assert_eq!(route.path.len(), 3);
        assert_eq!(route.path.points()[1].to_lon_lat(), [-65.4, -24.8]);
    }

    #[test]
    fn parses_encoded_geometry() {
        let route =
            parse(r#"{"routes":[{"summary":{"distance":3.0},"geometry":"_p~iF~ps|U_ulLnnqC"}]}"#)
                .unwrap();
        assert_eq!(route.path.len(), 2);
        assert!((route.path.points()[0].lat() - 38.5).abs() < 1e-9);
    }

    #[test]
    fn empty_routes_is_empty_route() {
        assert_eq!(parse(r#"{"routes":[]}"#), Err(DirectionsError::EmptyRoute));
        assert_eq!(parse(r#"{}"#), Err(DirectionsError::EmptyRoute));
    }

    #[test]
    fn missing_distance_is_malformed() {
        let result = parse(r#"{"routes":[{"summary":{},"geometry":"_p~iF~ps|U_ulLnnqC"}]}"#);
        assert!(matches!(result, Err(DirectionsError::Malformed(_))));
    }

    #[test]
    fn bad_geometry_is_malformed() {
        let result = parse(
            r#"{"routes":[{"summary":{"distance":1.0},
                "geometry":{"coordinates":[[200.0,0.0],[0.0,0.0]]}}]}"#,
        );
        assert!(matches!(result, Err(DirectionsError::Malformed(_))));
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let client = DirectionsClient::new(DirectionsConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..DirectionsConfig::default()
        })
        .unwrap();
        let a = Coordinate::new(-65.45, -24.9).unwrap();
        let b = Coordinate::new(-65.40, -24.8).unwrap();
        assert_eq!(client.route(&[a, b, a]), Err(DirectionsError::MissingApiKey));
        assert!(client.matrix_for(&[a, b]).is_empty());
    }

    #[test]
    fn urls_substitute_profile() {
        let config = DirectionsConfig::default();
        assert_eq!(
            config.route_url(),
            "https://api.openrouteservice.org/v2/directions/driving-car/json"
        );
        assert_eq!(config.matrix_url(), "https://api.openrouteservice.org/v2/matrix/driving-car");
    }

    #[test]
    fn config_from_lookup() {
        let config = DirectionsConfig::from_lookup(|name| match name {
            "ROUTING_BASE_URL" => Some("http://localhost:8080/ors/".to_string()),
            "ROUTING_API_KEY" => Some("secret".to_string()),
            "ROUTING_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "http://localhost:8080/ors");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.profile, "driving-car");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = DirectionsConfig::from_lookup(|name| {
            (name == "ROUTING_API_KEY").then(|| "  ".to_string())
        });
        assert!(config.api_key.is_none());
    }

    #[test]
    fn matrix_with_null_cell_is_unavailable() {
        let response: MatrixResponse =
            serde_json::from_str(r#"{"distances":[[0.0,null],[1.0,0.0]]}"#).unwrap();
        assert!(matrix_from_response(response, 2).is_empty());

        let response: MatrixResponse =
            serde_json::from_str(r#"{"distances":[[0.0,2.5],[2.4,0.0]]}"#).unwrap();
        assert_eq!(matrix_from_response(response, 2), vec![vec![0.0, 2.5], vec![2.4, 0.0]]);
    }
}
