//! Persistence boundary: storage keys and typed snapshot codec.
//!
//! Everything read back from the key/value store is decoded here. A value
//! that doesn't match its schema is reported as `CorruptRecord` instead of
//! being replaced by a default.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::PadimanError;
use crate::ports::KvStore;

pub mod keys {
    pub const TASKS: &str = "tasks";
    pub const TASK_COUNT: &str = "task_count";
    pub const WALLET: &str = "wallet";
    pub const COFFER: &str = "platform_coffer";
    pub const PROFILE: &str = "profile";
    pub const RUNNER_ID: &str = "runner_id";
    pub const GEO_CACHE: &str = "geo_cache";
}

/// Load and decode `key`. Missing keys are `Ok(None)`.
pub async fn load<T: DeserializeOwned>(
    kv: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, PadimanError> {
    let Some(value) = kv.get(key).await? else {
        return Ok(None);
    };
    decode(key, value).map(Some)
}

pub fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, PadimanError> {
    serde_json::from_value(value).map_err(|e| {
        tracing::error!(key, error = %e, "rejecting malformed record");
        PadimanError::CorruptRecord {
            key: key.to_string(),
            reason: e.to_string(),
        }
    })
}

pub fn encode<T: Serialize>(key: &str, value: &T) -> Result<(String, Value), PadimanError> {
    let json = serde_json::to_value(value).map_err(|e| PadimanError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok((key.to_string(), json))
}
