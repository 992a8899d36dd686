//! EventSink port - change notifications for the presentation layer.
//!
//! # Implementations
//! - NoopEventSink: drops everything
//! - BroadcastEventSink: fan-out to any number of subscribers

use crate::domain::DomainEvent;

/// EventSink receives domain events after a change is committed.
///
/// Emission is fire-and-forget: a sink can't fail the operation that
/// produced the event.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}
