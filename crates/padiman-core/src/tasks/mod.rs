//! Task Store - the persisted task list and the poster's post counter.
//!
//! The list is one snapshot under `tasks`, newest first. Every record is
//! schema-checked on the way in; one bad record fails the whole load rather
//! than silently dropping tasks that may hold escrow.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{PadimanError, Task, TaskId};
use crate::persistence::{self, keys};
use crate::ports::KvStore;

#[derive(Clone)]
pub struct TaskStore {
    kv: Arc<dyn KvStore>,
}

impl TaskStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn load(&self) -> Result<Vec<Task>, PadimanError> {
        let tasks: Vec<Task> = persistence::load(self.kv.as_ref(), keys::TASKS)
            .await?
            .unwrap_or_default();
        for task in &tasks {
            task.validate().map_err(|reason| {
                tracing::error!(task_id = %task.id, %reason, "rejecting invalid task record");
                PadimanError::CorruptRecord {
                    key: keys::TASKS.to_string(),
                    reason,
                }
            })?;
        }
        Ok(tasks)
    }

    pub async fn get(&self, task_id: TaskId) -> Result<Task, PadimanError> {
        self.load()
            .await?
            .into_iter()
            .find(|t| t.id == task_id)
            .ok_or(PadimanError::TaskNotFound(task_id))
    }

    /// Lifetime number of tasks posted from this device. Never decremented.
    pub async fn post_count(&self) -> Result<u64, PadimanError> {
        Ok(persistence::load(self.kv.as_ref(), keys::TASK_COUNT)
            .await?
            .unwrap_or(0))
    }

    pub fn entries(&self, tasks: &[Task]) -> Result<Vec<(String, Value)>, PadimanError> {
        Ok(vec![persistence::encode(keys::TASKS, &tasks)?])
    }

    pub fn count_entry(&self, count: u64) -> Result<(String, Value), PadimanError> {
        persistence::encode(keys::TASK_COUNT, &count)
    }

    pub async fn save(&self, tasks: &[Task]) -> Result<(), PadimanError> {
        self.kv.set_many(self.entries(tasks)?).await?;
        Ok(())
    }
}

/// Position of `task_id` in `tasks`.
pub fn position(tasks: &[Task], task_id: TaskId) -> Result<usize, PadimanError> {
    tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or(PadimanError::TaskNotFound(task_id))
}
