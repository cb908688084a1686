//! lote-router: two-vehicle delivery route planning
//!
//! Splits a handful of stops between two vehicles, orders each vehicle's
//! circuit from the collection point and resolves road geometry, falling back
//! to straight lines when the directions service is unavailable.

pub mod error;
pub mod registry;
pub mod traits;
pub mod haversine;
pub mod partition;
pub mod circuit;
pub mod polyline;
pub mod directions;
pub mod resolver;
pub mod manual;
pub mod solver;

pub use error::{ErrorPayload, PlanError, Result};
pub use registry::{Coordinate, CoordinateRegistry, Stop, StopCode, StopSelection, VehicleSlot};
pub use solver::{OptimizationResult, PlannedRoute, RoutePlanner, RouteResult, Side, SolveOptions};
