//! Prompter port - interactive yes/no and amount input.

use async_trait::async_trait;

use crate::domain::{Decision, DecisionRequest};

/// Prompter answers the questions a settlement flow suspends on.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn decide(&self, request: &DecisionRequest) -> Decision;
}
