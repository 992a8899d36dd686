//! StaticLocationSource - a location source whose fix is set by hand.
//!
//! Stands in for device GPS in tests, demos and the CLI (`--at lat,lon`).

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::GeoPoint;
use crate::ports::LocationSource;

#[derive(Debug, Default)]
pub struct StaticLocationSource {
    fix: RwLock<Option<GeoPoint>>,
}

impl StaticLocationSource {
    pub fn new(fix: Option<GeoPoint>) -> Self {
        Self {
            fix: RwLock::new(fix),
        }
    }

    /// Move the device.
    pub async fn set(&self, fix: Option<GeoPoint>) {
        *self.fix.write().await = fix;
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn current_position(&self) -> Option<GeoPoint> {
        *self.fix.read().await
    }
}
