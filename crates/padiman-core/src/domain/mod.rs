//! Domain model (ids, money, geo points, tasks, accounts, decisions, errors, events).

pub mod account;
pub mod decision;
pub mod errors;
pub mod events;
pub mod geo;
pub mod ids;
pub mod money;
pub mod profile;
pub mod task;

pub use account::{Balances, Coffer, Transaction, TransactionKind, TransactionMeta, Wallet};
pub use decision::{Decision, DecisionRequest, FundingPurpose};
pub use errors::{ErrorKind, PadimanError, StorageError};
pub use events::DomainEvent;
pub use geo::GeoPoint;
pub use ids::{RunnerId, TaskId, TransactionId};
pub use money::Naira;
pub use profile::{Profile, ProfileLocation};
pub use task::{RevealedContact, Task, TaskStatus};
