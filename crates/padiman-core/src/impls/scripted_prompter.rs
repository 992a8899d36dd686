//! ScriptedPrompter - answers prompts from a queue of prepared decisions.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Decision, DecisionRequest};
use crate::ports::Prompter;

/// Pops one decision per request. An exhausted script declines.
///
/// Every request seen is recorded so tests can assert on what was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    script: Mutex<VecDeque<Decision>>,
    asked: Mutex<Vec<DecisionRequest>>,
}

impl ScriptedPrompter {
    pub fn new(script: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub async fn asked(&self) -> Vec<DecisionRequest> {
        self.asked.lock().await.clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn decide(&self, request: &DecisionRequest) -> Decision {
        self.asked.lock().await.push(request.clone());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Decision::Decline)
    }
}
