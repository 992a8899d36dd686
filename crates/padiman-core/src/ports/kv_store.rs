//! KvStore port - on-device key/value persistence.
//!
//! Values are whole JSON documents: callers replace a snapshot, there is no
//! partial update. Typed decoding and record validation happen above this
//! layer, in the stores that own each key.
//!
//! # Implementations
//! - InMemoryKvStore (tests, demos)
//! - JsonFileKvStore (one JSON file per key, batches journaled)

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::StorageError;

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Write several keys as one batch.
    ///
    /// The default writes them one by one; adapters that can do better override it.
    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(&key, value).await?;
        }
        Ok(())
    }
}
