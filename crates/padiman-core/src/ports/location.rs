//! LocationSource port - device position on demand.
//!
//! Caching and staleness rules live in `geo::GeoLocator`, not in the sources.

use async_trait::async_trait;

use crate::domain::GeoPoint;

#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Current fix, or `None` when location is unavailable or denied.
    async fn current_position(&self) -> Option<GeoPoint>;
}
