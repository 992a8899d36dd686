//! ProfileProvider port - identity and contact details of the local actor.

use async_trait::async_trait;

use crate::domain::{PadimanError, Profile, RunnerId};

#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn load_profile(&self) -> Result<Option<Profile>, PadimanError>;

    async fn save_profile(&self, profile: &Profile) -> Result<(), PadimanError>;

    /// Stable per-device runner id, created on first use.
    async fn runner_id(&self) -> Result<RunnerId, PadimanError>;
}
