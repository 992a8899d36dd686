//! Events - change notifications for the presentation layer.

use serde::{Deserialize, Serialize};

use super::ids::TaskId;

/// DomainEvent tells subscribers which snapshot to re-read.
///
/// Events carry no state: the stores stay the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// The persisted task list changed. `task_id` names the task that moved.
    TasksChanged { task_id: Option<TaskId> },
    WalletChanged,
    CofferChanged,
}
