//! Impls - port implementations.
//!
//! # Included
//! - **InMemoryKvStore** / **JsonFileKvStore**: on-device persistence
//! - **KvProfileStore**: profile + runner id over a `KvStore`
//! - **NoopEventSink** / **BroadcastEventSink**: presentation hooks
//! - **StaticLocationSource**: hand-set location fix
//! - **ScriptedPrompter**: canned answers for settlement prompts

pub mod event_sinks;
pub mod file_kv;
pub mod inmem_kv;
pub mod kv_profile;
pub mod scripted_prompter;
pub mod static_location;

pub use self::event_sinks::{BroadcastEventSink, NoopEventSink};
pub use self::file_kv::JsonFileKvStore;
pub use self::inmem_kv::InMemoryKvStore;
pub use self::kv_profile::KvProfileStore;
pub use self::scripted_prompter::ScriptedPrompter;
pub use self::static_location::StaticLocationSource;
