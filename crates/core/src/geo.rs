//! Great-circle distance between a user and a meeting venue.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG value).
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Haversine great-circle distance in meters.
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates {
            latitude,
            longitude,
        }
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let p = coords(-33.9249, 18.4241);
        assert_eq!(haversine_meters(p, p), 0.0);
    }

    #[test]
    fn known_distance_cape_town_to_johannesburg() {
        // Cape Town CBD to Johannesburg CBD is roughly 1,260 km.
        let cpt = coords(-33.9249, 18.4241);
        let jhb = coords(-26.2041, 28.0473);
        let d = haversine_meters(cpt, jhb);
        assert!((1_200_000.0..1_320_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn short_distances_are_plausible() {
        // Two points ~111 m apart along a meridian (0.001 degrees latitude).
        let a = coords(-33.9249, 18.4241);
        let b = coords(-33.9259, 18.4241);
        let d = haversine_meters(a, b);
        assert!((100.0..125.0).contains(&d), "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = coords(-33.9, 18.4);
        let b = coords(-34.0, 18.5);
        let ab = haversine_meters(a, b);
        let ba = haversine_meters(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }
}
