//! KvProfileStore - profile and runner identity kept in the key/value store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{PadimanError, Profile, RunnerId};
use crate::persistence::{self, keys};
use crate::ports::{IdGenerator, KvStore, ProfileProvider};

pub struct KvProfileStore {
    kv: Arc<dyn KvStore>,
    ids: Arc<dyn IdGenerator>,
    /// Serializes first-use runner id creation.
    runner_lock: Mutex<()>,
}

impl KvProfileStore {
    pub fn new(kv: Arc<dyn KvStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            kv,
            ids,
            runner_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ProfileProvider for KvProfileStore {
    async fn load_profile(&self) -> Result<Option<Profile>, PadimanError> {
        persistence::load(self.kv.as_ref(), keys::PROFILE).await
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), PadimanError> {
        let (key, value) = persistence::encode(keys::PROFILE, profile)?;
        self.kv.set(&key, value).await?;
        Ok(())
    }

    async fn runner_id(&self) -> Result<RunnerId, PadimanError> {
        let _guard = self.runner_lock.lock().await;
        if let Some(id) = persistence::load(self.kv.as_ref(), keys::RUNNER_ID).await? {
            return Ok(id);
        }
        let id = self.ids.generate_runner_id();
        let (key, value) = persistence::encode(keys::RUNNER_ID, &id)?;
        self.kv.set(&key, value).await?;
        tracing::info!(runner_id = %id, "created device runner id");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryKvStore;
    use crate::ports::{SystemClock, UlidGenerator};

    fn store() -> KvProfileStore {
        KvProfileStore::new(
            Arc::new(InMemoryKvStore::new()),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
    }

    #[tokio::test]
    async fn runner_id_is_stable() {
        let store = store();
        let first = store.runner_id().await.unwrap();
        let second = store.runner_id().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn profile_roundtrips() {
        let store = store();
        assert!(store.load_profile().await.unwrap().is_none());

        let profile = Profile {
            phone: Some("+2348000000000".into()),
            ..Profile::default()
        };
        store.save_profile(&profile).await.unwrap();
        assert_eq!(store.load_profile().await.unwrap(), Some(profile));
    }
}
