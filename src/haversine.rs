//! Haversine distance metric (fallback when road distances are unavailable).
//!
//! Great-circle distance between coordinates. Ignores roads but is always
//! available, so partitioning and the emergency geometry rely on it.

use crate::registry::Coordinate;
use crate::traits::DistanceMatrixProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat().to_radians();
    let lat2_rad = to.lat().to_radians();
    let delta_lat = (to.lat() - from.lat()).to_radians();
    let delta_lng = (to.lon() - from.lon()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Sum of consecutive leg lengths along a path.
pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|leg| haversine_km(leg[0], leg[1]))
        .sum()
}

/// Haversine-based distance matrix provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<f64>> {
        let n = locations.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let km = haversine_km(locations[i], locations[j]);
                matrix[i][j] = km;
                matrix[j][i] = km;
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_km(coord(-65.4, -24.8), coord(-65.4, -24.8));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Salta (-65.41, -24.79) to San Salvador de Jujuy (-65.30, -24.19)
        // Actual distance ~67 km
        let dist = haversine_km(coord(-65.41, -24.79), coord(-65.30, -24.19));
        assert!(dist > 60.0 && dist < 75.0, "Salta to Jujuy should be ~67km, got {}", dist);
    }

    #[test]
    fn test_haversine_symmetric_and_triangle() {
        let a = coord(-65.40, -24.80);
        let b = coord(-65.35, -24.85);
        let c = coord(-65.50, -24.75);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-12);
        assert!(haversine_km(a, c) <= haversine_km(a, b) + haversine_km(b, c) + 1e-9);
    }

    #[test]
    fn test_path_length_sums_legs() {
        let a = coord(-65.40, -24.80);
        let b = coord(-65.35, -24.85);
        let expected = haversine_km(a, b) * 2.0;
        assert!((path_length_km(&[a, b, a]) - expected).abs() < 1e-9);
        assert_eq!(path_length_km(&[a]), 0.0);
    }

    #[test]
    fn test_matrix_diagonal_is_zero() {
        let locations = vec![coord(-65.1, -24.1), coord(-65.2, -24.2), coord(-65.3, -24.3)];
        let matrix = HaversineMatrix.matrix_for(&locations);

        for i in 0..locations.len() {
            assert_eq!(matrix[i][i], 0.0, "Diagonal should be zero");
        }
    }

    #[test]
    fn test_matrix_symmetric() {
        let locations = vec![coord(-65.1, -24.1), coord(-65.2, -24.2)];
        let matrix = HaversineMatrix.matrix_for(&locations);

        assert_eq!(matrix[0][1], matrix[1][0], "Matrix should be symmetric");
        assert!(matrix[0][1] > 0.0);
    }
}
