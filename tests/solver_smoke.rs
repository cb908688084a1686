use lote_router::directions::{DirectionsError, DirectionsRoute};
use lote_router::polyline::Polyline;
use lote_router::resolver::GeometrySource;
use lote_router::traits::{DirectionsProvider, DistanceMatrixProvider};
use lote_router::{Coordinate, CoordinateRegistry, RoutePlanner, VehicleSlot};

struct MockDirections;

impl DirectionsProvider for MockDirections {
    fn route(&self, waypoints: &[Coordinate]) -> Result<DirectionsRoute, DirectionsError> {
        Ok(DirectionsRoute {
            distance_km: 10.0 * (waypoints.len() - 1) as f64,
            path: Polyline::new(waypoints.to_vec()),
        })
    }
}

struct MockMatrix;

impl DistanceMatrixProvider for MockMatrix {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<f64>> {
        let mut matrix = vec![vec![0.0; locations.len()]; locations.len()];
        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                matrix[i][j] = (from.lon() - to.lon()).abs() + (from.lat() - to.lat()).abs();
            }
        }
        matrix
    }
}

fn registry() -> CoordinateRegistry {
    let origin = Coordinate::new(0.0, 0.0).unwrap();
    CoordinateRegistry::new(origin, [VehicleSlot::new("a", "A-1"), VehicleSlot::new("b", "B-1")])
        .with_stop("E1", 0.01, 0.0)
        .unwrap()
        .with_stop("E2", 0.02, 0.0)
        .unwrap()
        .with_stop("W1", -0.01, 0.0)
        .unwrap()
        .with_stop("W2", -0.02, 0.0)
        .unwrap()
}

#[test]
fn splits_east_and_west() {
    let planner = RoutePlanner::new(registry(), MockDirections).with_matrix(MockMatrix);
    let result = planner
        .solve_route_optimization(&["w2", "e1", "W1", "E2"])
        .unwrap();

    let a = result.route_a.planned().unwrap();
    let b = result.route_b.planned().unwrap();

    let a_ids: Vec<&str> = a.optimal_order.iter().map(|c| c.as_str()).collect();
    let b_ids: Vec<&str> = b.optimal_order.iter().map(|c| c.as_str()).collect();
    assert_eq!(a_ids, vec!["E1", "E2"]);
    assert_eq!(b_ids, vec!["W1", "W2"]);

    assert_eq!(a.vehicle.name, "a");
    assert_eq!(a.source(), GeometrySource::ExternalService);
    assert_eq!(a.distance_km(), 30.0);
    assert!((a.circuit_km - 0.04).abs() < 1e-12);
    assert_eq!(result.total_km(), 60.0);
}
