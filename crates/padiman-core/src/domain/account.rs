//! Ledger accounts: the actor's wallet and the platform coffer.
//!
//! Both keep an append-only transaction log. Each `TransactionKind` has a
//! fixed signed effect on the account that logged it, so balances can be
//! rebuilt from the log alone (`replay`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{RunnerId, TaskId, TransactionId};
use super::money::Naira;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Deduct,
    EscrowHold,
    EscrowRelease,
    EscrowRefund,
    /// Finders fee collected into the coffer.
    FindersFee,
}

impl TransactionKind {
    /// Effect on a wallet as `(balance_delta, escrow_delta)`.
    pub fn wallet_effect(self, amount: Naira) -> (i128, i128) {
        let a = amount.as_signed();
        match self {
            TransactionKind::Deposit => (a, 0),
            TransactionKind::Withdrawal | TransactionKind::Deduct => (-a, 0),
            TransactionKind::EscrowHold => (0, a),
            TransactionKind::EscrowRelease | TransactionKind::EscrowRefund => (a, -a),
            TransactionKind::FindersFee => (0, 0),
        }
    }

    /// Effect on the platform coffer balance.
    pub fn coffer_effect(self, amount: Naira) -> i128 {
        let a = amount.as_signed();
        match self {
            TransactionKind::EscrowHold | TransactionKind::FindersFee => a,
            TransactionKind::EscrowRelease | TransactionKind::EscrowRefund => -a,
            TransactionKind::Deposit | TransactionKind::Withdrawal | TransactionKind::Deduct => 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_id: Option<RunnerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransactionMeta {
    pub fn for_task(task_id: TaskId) -> Self {
        Self {
            task_id: Some(task_id),
            ..Self::default()
        }
    }

    pub fn with_runner(mut self, runner_id: Option<RunnerId>) -> Self {
        self.runner_id = runner_id;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Immutable log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Naira,
    #[serde(default)]
    pub meta: TransactionMeta,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Naira,
    /// Open escrow holds keyed by task. Resolved entries are removed.
    #[serde(default)]
    pub escrows: BTreeMap<TaskId, Naira>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Wallet {
    pub fn escrow_total(&self) -> Naira {
        self.escrows.values().sum()
    }

    pub fn held_for(&self, task_id: TaskId) -> Naira {
        self.escrows.get(&task_id).copied().unwrap_or_default()
    }

    /// Rebuild `(balance, escrow_total)` from the log.
    pub fn replay(&self) -> (i128, i128) {
        self.transactions.iter().fold((0, 0), |(bal, esc), t| {
            let (db, de) = t.kind.wallet_effect(t.amount);
            (bal + db, esc + de)
        })
    }

    /// Log and balances agree.
    pub fn is_consistent(&self) -> bool {
        self.replay() == (self.balance.as_signed(), self.escrow_total().as_signed())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coffer {
    pub balance: Naira,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Coffer {
    pub fn replay(&self) -> i128 {
        self.transactions
            .iter()
            .map(|t| t.kind.coffer_effect(t.amount))
            .sum()
    }

    pub fn is_consistent(&self) -> bool {
        self.replay() == self.balance.as_signed()
    }
}

/// Read-only summary for presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub wallet_balance: Naira,
    pub escrow_committed: Naira,
    pub platform_coffer: Naira,
}
