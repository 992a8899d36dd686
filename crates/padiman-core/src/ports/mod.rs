//! Ports - abstraction layer.
//!
//! Each trait is the seam to something outside the settlement core: time,
//! id generation, on-device storage, device location, the local profile,
//! interactive prompts and the presentation layer.

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod kv_store;
pub mod location;
pub mod profile;
pub mod prompter;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::kv_store::KvStore;
pub use self::location::LocationSource;
pub use self::profile::ProfileProvider;
pub use self::prompter::Prompter;
