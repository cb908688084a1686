//! Two-vehicle route planner.
//!
//! validate -> partition -> per-vehicle circuit -> per-vehicle geometry -> assemble.
//! The two vehicles are planned concurrently; neither shares mutable state with
//! the other, so the result does not depend on scheduling.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::circuit::{MAX_CIRCUIT_STOPS, solve_circuit};
use crate::error::{PlanError, Result};
use crate::haversine::HaversineMatrix;
use crate::manual::{OverrideError, apply_manual_override};
use crate::partition::partition_stops;
use crate::registry::{Coordinate, CoordinateRegistry, Stop, StopCode, StopSelection, VehicleSlot};
use crate::resolver::{GeometrySource, ResolvedRoute, resolve_route};
use crate::traits::{DirectionsProvider, DistanceMatrixProvider};

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Fewest valid stops accepted (never below 2: each vehicle needs one).
    pub min_stops: usize,
    /// Most valid stops accepted; bounds the exhaustive searches. Values above
    /// [`MAX_CIRCUIT_STOPS`] are clamped to it.
    pub max_stops: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            min_stops: 2,
            max_stops: MAX_CIRCUIT_STOPS,
        }
    }
}

/// One vehicle's planned circuit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRoute {
    pub vehicle: VehicleSlot,
    /// Assigned stops, sorted by code.
    pub assigned_stops: Vec<StopCode>,
    /// Visiting order, origin excluded.
    pub optimal_order: Vec<StopCode>,
    /// Closed-tour cost the order was chosen on (km).
    pub circuit_km: f64,
    #[serde(flatten)]
    pub geometry: ResolvedRoute,
}

impl PlannedRoute {
    pub fn distance_km(&self) -> f64 {
        self.geometry.distance_km
    }

    pub fn source(&self) -> GeometrySource {
        self.geometry.source
    }

    /// Copy of this route with its fallback geometry replaced by pasted route JSON.
    pub fn with_manual_override(&self, payload: &str) -> std::result::Result<Self, OverrideError> {
        Ok(Self {
            geometry: apply_manual_override(&self.geometry, payload)?,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RouteResult {
    Planned(PlannedRoute),
    /// The vehicle received no stops.
    NoAssignment { vehicle: VehicleSlot },
}

impl RouteResult {
    pub fn vehicle(&self) -> &VehicleSlot {
        match self {
            RouteResult::Planned(route) => &route.vehicle,
            RouteResult::NoAssignment { vehicle } => vehicle,
        }
    }

    pub fn planned(&self) -> Option<&PlannedRoute> {
        match self {
            RouteResult::Planned(route) => Some(route),
            RouteResult::NoAssignment { .. } => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.planned().is_some()
    }

    pub fn distance_km(&self) -> f64 {
        self.planned().map_or(0.0, PlannedRoute::distance_km)
    }

    pub fn optimal_order(&self) -> &[StopCode] {
        self.planned()
            .map(|route| route.optimal_order.as_slice())
            .unwrap_or_default()
    }
}

/// Which of the two vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// Minimized partition objective (km).
    pub grouping_km: f64,
    pub route_a: RouteResult,
    pub route_b: RouteResult,
    /// Requested codes that were malformed or not registered.
    pub invalid_stops: Vec<String>,
}

impl OptimizationResult {
    pub fn route(&self, side: Side) -> &RouteResult {
        match side {
            Side::A => &self.route_a,
            Side::B => &self.route_b,
        }
    }

    pub fn route_for(&self, vehicle: &VehicleSlot) -> Option<&RouteResult> {
        [&self.route_a, &self.route_b]
            .into_iter()
            .find(|route| route.vehicle() == vehicle)
    }

    /// Combined road (or fallback) distance of both vehicles.
    pub fn total_km(&self) -> f64 {
        self.route_a.distance_km() + self.route_b.distance_km()
    }

    pub fn used_fallback(&self) -> bool {
        [&self.route_a, &self.route_b]
            .into_iter()
            .filter_map(RouteResult::planned)
            .any(|route| route.source() == GeometrySource::EmergencyFallback)
    }

    /// Copy of the result with one vehicle's fallback geometry replaced.
    pub fn with_manual_override(
        &self,
        side: Side,
        payload: &str,
    ) -> std::result::Result<Self, OverrideError> {
        let RouteResult::Planned(route) = self.route(side) else {
            return Err(OverrideError::NoGeometry);
        };
        let replaced = RouteResult::Planned(route.with_manual_override(payload)?);

        let mut result = self.clone();
        match side {
            Side::A => result.route_a = replaced,
            Side::B => result.route_b = replaced,
        }
        Ok(result)
    }
}

pub struct RoutePlanner<D, M = HaversineMatrix> {
    registry: CoordinateRegistry,
    directions: D,
    matrix: M,
    options: SolveOptions,
}

impl<D> RoutePlanner<D, HaversineMatrix>
where
    D: DirectionsProvider + Sync,
{
    /// Planner ordering stops by great-circle distance.
    pub fn new(registry: CoordinateRegistry, directions: D) -> Self {
        Self {
            registry,
            directions,
            matrix: HaversineMatrix,
            options: SolveOptions::default(),
        }
    }
}

impl<D, M> RoutePlanner<D, M>
where
    D: DirectionsProvider + Sync,
    M: DistanceMatrixProvider + Sync,
{
    /// Orders each vehicle's stops with `matrix` instead (e.g. road distances).
    pub fn with_matrix<N>(self, matrix: N) -> RoutePlanner<D, N>
    where
        N: DistanceMatrixProvider + Sync,
    {
        RoutePlanner {
            registry: self.registry,
            directions: self.directions,
            matrix,
            options: self.options,
        }
    }

    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &CoordinateRegistry {
        &self.registry
    }

    pub fn validate_stops<S: AsRef<str>>(&self, stop_codes: &[S]) -> StopSelection {
        self.registry.validate(stop_codes)
    }

    /// Splits the valid stops between the two vehicles and plans both circuits.
    ///
    /// Unknown codes are left out and reported in `invalid_stops`. Directions
    /// failures never surface here; they degrade the affected route to the
    /// straight-line fallback.
    #[tracing::instrument(skip_all, fields(requested = stop_codes.len()))]
    pub fn solve_route_optimization<S: AsRef<str>>(
        &self,
        stop_codes: &[S],
    ) -> Result<OptimizationResult> {
        match catch_unwind(AssertUnwindSafe(|| self.solve(stop_codes))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic);
                warn!(%message, "route optimization panicked");
                Err(PlanError::internal(message))
            }
        }
    }

    fn solve<S: AsRef<str>>(&self, stop_codes: &[S]) -> Result<OptimizationResult> {
        let selection = self.registry.validate(stop_codes);
        if !selection.invalid.is_empty() {
            debug!(invalid = ?selection.invalid, "ignoring unknown stops");
        }

        let valid = selection.valid.len();
        let min = self.options.min_stops.max(2);
        if valid < min {
            return Err(PlanError::TooFewStops { valid, min });
        }
        let max = self.options.max_stops.min(MAX_CIRCUIT_STOPS);
        if valid > max {
            return Err(PlanError::TooManyStops { count: valid, max });
        }

        let partition = partition_stops(&selection.valid)?;
        let [vehicle_a, vehicle_b] = self.registry.vehicles();

        let (route_a, route_b) = rayon::join(
            || self.plan_vehicle(vehicle_a, &partition.group_a),
            || self.plan_vehicle(vehicle_b, &partition.group_b),
        );

        let result = OptimizationResult {
            grouping_km: partition.grouping_km,
            route_a: route_a?,
            route_b: route_b?,
            invalid_stops: selection.invalid,
        };
        info!(
            stops = valid,
            grouping_km = result.grouping_km,
            total_km = result.total_km(),
            fallback = result.used_fallback(),
            "route optimization complete"
        );
        Ok(result)
    }

    fn plan_vehicle(&self, vehicle: &VehicleSlot, group: &[Stop]) -> Result<RouteResult> {
        if group.is_empty() {
            warn!(vehicle = %vehicle.name, "vehicle received no stops");
            return Ok(RouteResult::NoAssignment {
                vehicle: vehicle.clone(),
            });
        }

        let origin = self.registry.origin();
        let mut locations = Vec::with_capacity(group.len() + 1);
        locations.push(origin);
        locations.extend(group.iter().map(|stop| stop.coordinate));

        let indices: Vec<usize> = (1..locations.len()).collect();
        let circuit = solve_circuit(&self.cost_matrix(&locations), &indices)?;

        let ordered: Vec<&Stop> = circuit.order.iter().map(|&i| &group[i - 1]).collect();
        let coordinates: Vec<Coordinate> = ordered.iter().map(|stop| stop.coordinate).collect();
        let geometry = resolve_route(&self.directions, origin, &coordinates);

        debug!(
            vehicle = %vehicle.name,
            order = ?ordered.iter().map(|stop| stop.code.as_str()).collect::<Vec<_>>(),
            circuit_km = circuit.cost,
            distance_km = geometry.distance_km,
            "planned vehicle circuit"
        );

        let mut assigned_stops: Vec<StopCode> =
            group.iter().map(|stop| stop.code.clone()).collect();
        assigned_stops.sort();

        Ok(RouteResult::Planned(PlannedRoute {
            vehicle: vehicle.clone(),
            assigned_stops,
            optimal_order: ordered.into_iter().map(|stop| stop.code.clone()).collect(),
            circuit_km: circuit.cost,
            geometry,
        }))
    }

    fn cost_matrix(&self, locations: &[Coordinate]) -> Vec<Vec<f64>> {
        let matrix = self.matrix.matrix_for(locations);
        let usable = matrix.len() == locations.len()
            && matrix.iter().all(|row| {
                row.len() == locations.len() && row.iter().all(|km| km.is_finite() && *km >= 0.0)
            });
        if usable {
            return matrix;
        }

        debug!("distance matrix unavailable, using haversine");
        HaversineMatrix.matrix_for(locations)
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "route optimization panicked".to_string()
    }
}
