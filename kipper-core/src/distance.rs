//! Great-circle distance between district coordinates.

use geo::{Distance, Geodesic};

use crate::model::Coordinate;

/// Distance between two coordinates in kilometres, measured on the WGS84
/// ellipsoid rather than a flat-plane approximation.
///
/// Pure and deterministic; `distance_km(a, a)` is `0.0` and antipodal pairs
/// are handled without error.
#[must_use]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    Geodesic.distance(from.point(), to.point()) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_have_zero_distance() {
        let spot = Coordinate::new(11.9416, 79.8083);
        assert!(distance_km(spot, spot).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let reddiarpalayam = Coordinate::new(11.9416, 79.7916);
        let kurumbapet = Coordinate::new(11.9644, 79.7823);
        let forward = distance_km(reddiarpalayam, kurumbapet);
        let backward = distance_km(kurumbapet, reddiarpalayam);
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn one_longitude_degree_at_equator_is_about_111_km() {
        let west = Coordinate::new(0.0, 0.0);
        let east = Coordinate::new(0.0, 1.0);
        let separation = distance_km(west, east);
        assert!((separation - 111.32).abs() < 0.1, "got {separation}");
    }

    #[test]
    fn antipodal_points_do_not_error() {
        let origin = Coordinate::new(0.0, 0.0);
        let antipode = Coordinate::new(0.0, 180.0);
        let separation = distance_km(origin, antipode);
        assert!(separation.is_finite());
        assert!(separation > 19_000.0 && separation < 20_100.0, "got {separation}");
    }
}
