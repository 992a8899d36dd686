//! Great-circle distances.
//!
//! Missing or broken coordinates never fail a caller: the distance degrades
//! to 0 and a warning is logged.

use crate::domain::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers.
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    if !a.has_valid_coordinates() || !b.has_valid_coordinates() {
        tracing::warn!(
            a_lat = a.lat,
            a_lon = a.lon,
            b_lat = b.lat,
            b_lon = b.lon,
            "distance_km: invalid coordinates"
        );
        return 0.0;
    }

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Distance between two optional points; 0 when either is absent.
pub fn distance_between(a: Option<&GeoPoint>, b: Option<&GeoPoint>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => distance_km(a, b),
        _ => 0.0,
    }
}

/// Trip length used for pricing: poster -> runner -> errand.
///
/// A leg with a missing endpoint contributes 0.
pub fn route_distance_km(
    poster: Option<&GeoPoint>,
    runner: Option<&GeoPoint>,
    errand: Option<&GeoPoint>,
) -> f64 {
    distance_between(poster, runner) + distance_between(runner, errand)
}
