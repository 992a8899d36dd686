//! padiman-core
//!
//! Settlement core of the Padiman errand marketplace: a poster posts an
//! errand, a nearby runner accepts it, escrow settles on completion.
//!
//! # Modules
//! - **domain**: ids, money, geo points, tasks, accounts, decisions, errors, events
//! - **ports**: seams to time, ids, storage, location, profile, prompts, presentation
//! - **impls**: in-memory and file-backed port implementations
//! - **persistence**: storage keys and validated snapshot decoding
//! - **config**: environment-driven configuration
//! - **geo**: haversine distances and the cache-aware device locator
//! - **ledger**: wallet, escrow and platform coffer money movement
//! - **tasks**: the persisted task list
//! - **matching**: pricing and proximity ranking
//! - **settlement**: the task state machine and its money moves
//! - **app**: `AppBuilder` / `Marketplace` wiring

pub mod app;
pub mod config;
pub mod domain;
pub mod geo;
pub mod impls;
pub mod ledger;
pub mod matching;
pub mod persistence;
pub mod ports;
pub mod settlement;
pub mod tasks;

pub use app::{AppBuilder, BuildError, Marketplace};
pub use config::Config;
pub use domain::{Naira, PadimanError};
