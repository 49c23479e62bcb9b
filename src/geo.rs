//! Geofence evaluation
//!
//! Pure great-circle math on a spherical Earth approximation. No state,
//! no side effects; total over finite coordinates. Inputs are degrees.
//! Out-of-range values produce a mathematically defined but physically
//! meaningless result; upstream callers own input sanity.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers (spherical approximation)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84-style coordinate pair, in degrees
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine great-circle distance between two points, in kilometers
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Admission check against the configured radius
///
/// The boundary is inclusive: a claim exactly at the radius is admitted.
pub fn within_radius(distance_km: f64, radius_km: f64) -> bool {
    distance_km <= radius_km
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_identical_points() {
        let p = GeoPoint::new(47.3769, 8.5417);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(1.3521, 103.8198);
        let b = GeoPoint::new(1.2903, 103.8520);
        let ab = distance_km(a, b);
        let ba = distance_km(b, a);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn test_one_degree_of_longitude_at_the_equator() {
        // 2 * pi * 6371 / 360
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111.19492).abs() < 1e-3);
    }

    #[test]
    fn test_pole_to_pole_is_half_the_circumference() {
        let d = distance_km(GeoPoint::new(90.0, 0.0), GeoPoint::new(-90.0, 0.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_equator_fixture_is_about_a_tenth_of_a_kilometer() {
        // 0.0009 degrees of longitude on the equator ~ 100 meters
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.0009));
        assert!((d - 0.1).abs() < 1e-3, "expected ~0.1 km, got {d}");
    }

    #[test]
    fn test_admission_boundary_is_inclusive() {
        assert!(within_radius(0.1, 0.1));
        assert!(!within_radius(0.10001, 0.1));
    }

    #[test]
    fn test_nearby_point_admitted_at_default_radius_rejected_at_half() {
        // ~89 meters out: inside the 0.1 km fence, outside the 0.05 km one
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.0008));
        assert!(within_radius(d, 0.1));
        assert!(!within_radius(d, 0.05));
    }
}
