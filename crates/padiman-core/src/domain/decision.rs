//! Decision model: the points where a settlement flow waits for the user.
//!
//! A flow that needs the user returns a `DecisionRequest` instead of blocking.
//! The caller answers with a `Decision` and resumes the flow.

use serde::{Deserialize, Serialize};

use super::ids::TaskId;
use super::money::Naira;

/// What the funds are for, so the prompt can say so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingPurpose {
    FindersFee,
    Escrow,
}

/// A question the user has to answer before the flow continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum DecisionRequest {
    /// Pay `fee` to unlock the poster's contact details?
    ConfirmFindersFee {
        task_id: TaskId,
        fee: Naira,
        distance_km: f64,
    },

    /// The wallet is short; deposit at least `shortfall` to continue.
    Deposit {
        purpose: FundingPurpose,
        required: Naira,
        available: Naira,
        shortfall: Naira,
    },
}

impl DecisionRequest {
    /// Human-readable prompt text.
    pub fn prompt(&self) -> String {
        match self {
            DecisionRequest::ConfirmFindersFee { fee, .. } => format!(
                "A finders fee of {fee} is required so the runner can get contact details. Pay now?"
            ),
            DecisionRequest::Deposit {
                required,
                available,
                shortfall,
                ..
            } => format!(
                "You need {required} but have {available}. Shortfall: {shortfall}. Deposit at least {shortfall}?"
            ),
        }
    }
}

/// The user's answer to a `DecisionRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "amount", rename_all = "snake_case")]
pub enum Decision {
    Confirm,
    Decline,
    Deposit(Naira),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_prompt_mentions_shortfall() {
        let req = DecisionRequest::Deposit {
            purpose: FundingPurpose::Escrow,
            required: Naira::new(594),
            available: Naira::new(94),
            shortfall: Naira::new(500),
        };
        let text = req.prompt();
        assert!(text.contains("₦594"));
        assert!(text.contains("₦500"));
    }

    #[test]
    fn decision_is_tagged() {
        let v = serde_json::to_value(Decision::Deposit(Naira::new(500))).unwrap();
        assert_eq!(v["decision"], "deposit");
        assert_eq!(v["amount"], 500);
    }
}
