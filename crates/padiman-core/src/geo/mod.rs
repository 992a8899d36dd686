//! Geo utility: distance math and the cache-aware device locator.

pub mod distance;
pub mod locator;

pub use self::distance::{EARTH_RADIUS_KM, distance_between, distance_km, route_distance_km};
pub use self::locator::GeoLocator;
