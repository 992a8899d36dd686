//! Errors - domain error type and its classification.

use thiserror::Error;

use super::ids::TaskId;
use crate::config::ConfigError;
use super::money::Naira;
use super::task::TaskStatus;

/// Operational classification of a [`PadimanError`].
///
/// - UserInput: bad input, nothing mutated, report and let the user retry.
/// - Funds: the wallet cannot cover the request; a deposit may fix it.
/// - Consistency: persisted ledger state is desynced; refuse and log loudly.
/// - Infrastructure: storage or configuration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserInput,
    Funds,
    Consistency,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum PadimanError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient funds: need {required}, have {available} (short by {shortfall})")]
    InsufficientFunds {
        required: Naira,
        available: Naira,
        shortfall: Naira,
    },

    #[error("ledger consistency violation: {0}")]
    Consistency(String),

    #[error("declined: {0}")]
    Declined(String),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("cannot {action} task {task_id} in status {status}")]
    InvalidTransition {
        task_id: TaskId,
        status: TaskStatus,
        action: &'static str,
    },

    #[error("corrupt record under key={key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PadimanError {
    pub fn insufficient(required: Naira, available: Naira) -> Self {
        Self::InsufficientFunds {
            required,
            available,
            shortfall: required.saturating_sub(available),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::Declined(_)
            | Self::TaskNotFound(_)
            | Self::InvalidTransition { .. } => ErrorKind::UserInput,
            Self::InsufficientFunds { .. } => ErrorKind::Funds,
            Self::Consistency(_) | Self::CorruptRecord { .. } => ErrorKind::Consistency,
            Self::Storage(_) | Self::Config(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Failures of a key-value persistence adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_reports_exact_shortfall() {
        let err = PadimanError::insufficient(Naira::new(594), Naira::new(100));
        match &err {
            PadimanError::InsufficientFunds { shortfall, .. } => {
                assert_eq!(*shortfall, Naira::new(494))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.kind(), ErrorKind::Funds);
        assert!(err.to_string().contains("₦494"));
    }

    #[test]
    fn storage_errors_are_infrastructure() {
        let err: PadimanError = StorageError::InvalidKey("../x".into()).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
