//! JsonFileKvStore - on-device persistence as one JSON file per key.
//!
//! Layout: `{data_dir}/{key}.json`. Writes go to a `.tmp` sibling first and
//! are renamed into place, so a reader never sees a half-written snapshot.
//!
//! `set_many` is all-or-nothing across keys. The whole batch is first
//! committed to `batch.journal`, then applied file by file, then the journal
//! is removed. A journal left behind by a failed apply or a crash is the
//! committed state: reads consult it, and the next write or `open` finishes
//! applying it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::StorageError;
use crate::ports::KvStore;

const JOURNAL: &str = "batch.journal";

#[derive(Debug, Clone)]
pub struct JsonFileKvStore {
    data_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileKvStore {
    /// Open (and create if needed) the data directory, finishing any batch
    /// an earlier run left half applied.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).await?;
        let store = Self {
            data_dir,
            write_lock: Arc::new(Mutex::new(())),
        };
        store.remove_stray_tmp_files().await?;
        store.replay_journal().await?;
        tracing::debug!(dir = %store.data_dir.display(), "opened json file store");
        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.data_dir.join(format!("{key}.json")))
    }

    fn journal_path(&self) -> PathBuf {
        self.data_dir.join(JOURNAL)
    }

    async fn write_tmp(&self, key: &str, value: &Value) -> Result<(PathBuf, PathBuf), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, contents).await?;
        Ok((tmp, path))
    }

    async fn write_file(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let (tmp, path) = self.write_tmp(key, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn read_journal(&self) -> Result<Option<Vec<(String, Value)>>, StorageError> {
        match fs::read(self.journal_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a committed batch and drop its journal.
    async fn apply(&self, entries: &[(String, Value)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.write_file(key, value).await?;
        }
        fs::remove_file(self.journal_path()).await?;
        Ok(())
    }

    async fn replay_journal(&self) -> Result<(), StorageError> {
        let Some(entries) = self.read_journal().await? else {
            return Ok(());
        };
        tracing::warn!(keys = entries.len(), "finishing interrupted batch write");
        self.apply(&entries).await
    }

    async fn remove_stray_tmp_files(&self) -> Result<(), StorageError> {
        let mut dir = fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_name().to_string_lossy().ends_with(".tmp") {
                fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;
        if let Some(entries) = self.read_journal().await? {
            // last write for the key wins, as when applying
            if let Some((_, value)) = entries.into_iter().rev().find(|(k, _)| k == key) {
                return Ok(Some(value));
            }
        }
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.replay_journal().await?;
        self.write_file(key, &value).await
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StorageError> {
        for (key, _) in &entries {
            self.path_for(key)?;
        }
        let _guard = self.write_lock.lock().await;
        self.replay_journal().await?;

        let journal = self.journal_path();
        let tmp = journal.with_extension("journal.tmp");
        let contents = serde_json::to_vec(&entries)?;
        if let Err(e) = fs::write(&tmp, contents).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        fs::rename(&tmp, &journal).await?;

        if let Err(e) = self.apply(&entries).await {
            tracing::warn!(error = %e, "batch committed but not yet applied");
            return Err(e);
        }
        Ok(())
    }
}
