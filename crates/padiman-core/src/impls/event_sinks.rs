//! EventSink implementations.

use tokio::sync::broadcast;

use crate::domain::DomainEvent;
use crate::ports::EventSink;

/// Drops every event. Default when nobody renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Fans events out to subscribers over a `tokio::sync::broadcast` channel.
///
/// Lagging or absent subscribers are ignored.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    tx: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: DomainEvent) {
        // no subscribers is fine
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let sink = BroadcastEventSink::default();
        let mut rx = sink.subscribe();

        sink.emit(DomainEvent::WalletChanged);
        sink.emit(DomainEvent::CofferChanged);

        assert_eq!(rx.recv().await.unwrap(), DomainEvent::WalletChanged);
        assert_eq!(rx.recv().await.unwrap(), DomainEvent::CofferChanged);
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        BroadcastEventSink::new(1).emit(DomainEvent::WalletChanged);
        NoopEventSink.emit(DomainEvent::TasksChanged { task_id: None });
    }
}
