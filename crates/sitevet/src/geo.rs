//! Great-circle distance between coordinate pairs.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated geographic position in decimal degrees.
///
/// Construction rejects anything outside [-90, 90] latitude or
/// [-180, 180] longitude, including NaN and infinities. A record whose
/// coordinates fail validation simply has no location; it is never
/// coerced to (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Validate a latitude/longitude pair.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon)
        {
            Some(Self { lat, lon })
        } else {
            None
        }
    }
}

/// Haversine distance between two points in kilometers.
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn test_zero_distance_on_identical_points() {
        let p = coords(30.0, 31.0);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let a = coords(48.8566, 2.3522);
        let b = coords(51.5074, -0.1278);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree along a meridian is ~111.2 km.
        let a = coords(0.0, 10.0);
        let b = coords(1.0, 10.0);
        assert!((distance_km(a, b) - 111.19).abs() < 0.5);
    }

    #[test]
    fn test_paris_to_london() {
        let paris = coords(48.8566, 2.3522);
        let london = coords(51.5074, -0.1278);
        let d = distance_km(paris, london);
        assert!((d - 343.5).abs() < 5.0);
    }

    #[test]
    fn test_longitude_delta_matters() {
        // Same latitude, different longitude: distance comes from the
        // longitude delta alone, so it must be non-zero.
        let a = coords(30.0, 31.0);
        let b = coords(30.0, 32.0);
        assert!(distance_km(a, b) > 90.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(-90.5, 0.0).is_none());
        assert!(Coordinates::new(0.0, 180.1).is_none());
        assert!(Coordinates::new(0.0, -181.0).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_accepts_boundary_values() {
        assert!(Coordinates::new(90.0, 180.0).is_some());
        assert!(Coordinates::new(-90.0, -180.0).is_some());
    }
}
