//! Task record and its status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::PadimanError;
use super::geo::GeoPoint;
use super::ids::{RunnerId, TaskId};
use super::money::Naira;

/// Task status.
///
/// State transitions:
/// - Posted -> Accepted -> Completed
/// - Posted -> Cancelled
///
/// Accepted -> Cancelled does not exist: acceptance is the commitment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Visible to nearby runners.
    Posted,

    /// A runner took it; escrow (if any) is held.
    Accepted,

    /// Escrow released to the runner.
    Completed,

    /// Withdrawn by the poster before anyone accepted.
    Cancelled,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Posted => "posted",
            TaskStatus::Accepted => "accepted",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poster contact handed to the runner once the finders fee is paid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedContact {
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// An errand task.
///
/// Settlement moves a task only through the `mark_*` methods. The fields stay
/// public for reading and for fixtures, so records read back from storage
/// go through `validate()`, which rejects combinations no transition produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub desc: String,
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub poster_geo: Option<GeoPoint>,

    /// Errand destination, when the poster gave one.
    #[serde(default)]
    pub errand_geo: Option<GeoPoint>,

    pub status: TaskStatus,

    /// Amount currently held in escrow for this task.
    #[serde(default)]
    pub escrow: Naira,

    #[serde(default)]
    pub runner_id: Option<RunnerId>,

    #[serde(default)]
    pub finders_fee: Naira,
    #[serde(default)]
    pub finders_fee_paid: bool,

    #[serde(default)]
    pub contact_revealed: bool,
    #[serde(default)]
    pub revealed_contact: Option<RevealedContact>,

    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,

    /// Posted inside the poster's free quota.
    #[serde(default)]
    pub free_post: bool,

    /// Provisional trip cost computed at post time for priced tasks.
    #[serde(default)]
    pub quoted_trip_cost: Naira,
}

impl Task {
    /// Create a task in `Posted`. Title and description must be non-blank.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        desc: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PadimanError> {
        let title = title.into().trim().to_string();
        let desc = desc.into().trim().to_string();
        if title.is_empty() || desc.is_empty() {
            return Err(PadimanError::Validation(
                "task title and description are required".into(),
            ));
        }
        Ok(Self {
            id,
            title,
            desc,
            created_at,
            poster_geo: None,
            errand_geo: None,
            status: TaskStatus::Posted,
            escrow: Naira::ZERO,
            runner_id: None,
            finders_fee: Naira::ZERO,
            finders_fee_paid: false,
            contact_revealed: false,
            revealed_contact: None,
            accepted_at: None,
            free_post: false,
            quoted_trip_cost: Naira::ZERO,
        })
    }

    /// Record a collected finders fee and the contact it unlocked.
    pub fn mark_finders_fee_paid(&mut self, fee: Naira, contact: RevealedContact) {
        self.finders_fee = fee;
        self.finders_fee_paid = true;
        self.contact_revealed = true;
        self.revealed_contact = Some(contact);
    }

    pub fn mark_escrow_held(&mut self, amount: Naira) {
        self.escrow += amount;
    }

    pub fn mark_accepted(&mut self, runner_id: RunnerId, at: DateTime<Utc>) {
        self.status = TaskStatus::Accepted;
        self.runner_id = Some(runner_id);
        self.accepted_at = Some(at);
    }

    pub fn mark_completed(&mut self) {
        self.status = TaskStatus::Completed;
        self.escrow = Naira::ZERO;
    }

    pub fn mark_cancelled(&mut self) {
        self.status = TaskStatus::Cancelled;
        self.escrow = Naira::ZERO;
    }

    /// Schema check applied to records read back from persistence.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() || self.desc.trim().is_empty() {
            return Err(format!("{}: blank title or description", self.id));
        }
        match self.status {
            TaskStatus::Posted if self.runner_id.is_some() => {
                Err(format!("{}: posted task already has a runner", self.id))
            }
            TaskStatus::Accepted if self.runner_id.is_none() || self.accepted_at.is_none() => {
                Err(format!("{}: accepted task without runner", self.id))
            }
            s if s.is_terminal() && !self.escrow.is_zero() => {
                Err(format!("{}: {s} task still holds escrow", self.id))
            }
            _ if self.contact_revealed && !self.finders_fee_paid => {
                Err(format!("{}: contact revealed without finders fee", self.id))
            }
            _ => Ok(()),
        }
    }
}
