//! Accept flow state: the questions an accept can stop on and the answers
//! collected so far.

use serde::{Deserialize, Serialize};

use crate::domain::{Decision, DecisionRequest, GeoPoint, RunnerId, Task, TaskId};

/// Points in the accept flow that need the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptStep {
    ConfirmFindersFee,
    FundFindersFee,
    FundEscrow,
}

/// Inputs of one accept run: who accepts, from where, and what the user
/// already answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AcceptContext {
    pub task_id: TaskId,
    pub runner_id: RunnerId,
    pub runner_geo: Option<GeoPoint>,
    pub answers: Vec<(AcceptStep, Decision)>,
}

impl AcceptContext {
    pub fn new(task_id: TaskId, runner_id: RunnerId, runner_geo: Option<GeoPoint>) -> Self {
        Self {
            task_id,
            runner_id,
            runner_geo,
            answers: Vec::new(),
        }
    }

    pub fn answer(&self, step: AcceptStep) -> Option<Decision> {
        self.answers
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, d)| *d)
    }

    pub fn ask(self, step: AcceptStep, request: DecisionRequest) -> AcceptOutcome {
        AcceptOutcome::Pending(PendingAccept {
            context: self,
            step,
            request,
        })
    }
}

/// An accept that stopped on a question.
///
/// Hand it back to `Settlement::resume_accept` with the answer. Nothing has
/// been persisted yet: every resume reruns the whole flow against fresh
/// state, replaying the answers given so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAccept {
    pub(crate) context: AcceptContext,
    step: AcceptStep,
    request: DecisionRequest,
}

impl PendingAccept {
    pub fn task_id(&self) -> TaskId {
        self.context.task_id
    }

    pub fn step(&self) -> AcceptStep {
        self.step
    }

    pub fn request(&self) -> &DecisionRequest {
        &self.request
    }

    /// Record `decision` for the current step and hand back the context.
    pub(crate) fn answered(self, decision: Decision) -> AcceptContext {
        let mut context = self.context;
        context.answers.retain(|(s, _)| *s != self.step);
        context.answers.push((self.step, decision));
        context
    }
}

/// Result of one accept attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    /// Committed; the task is now Accepted.
    Accepted(Task),
    /// Waiting on the user.
    Pending(PendingAccept),
}

impl AcceptOutcome {
    pub fn accepted(self) -> Option<Task> {
        match self {
            AcceptOutcome::Accepted(task) => Some(task),
            AcceptOutcome::Pending(_) => None,
        }
    }
}
