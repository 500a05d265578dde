//! Event Publisher Adapters
//!
//! `TracingPublisher` writes every event to the log; `RecordingPublisher`
//! keeps them in memory for inspection.

use crate::events::AccountabilityEvent;
use crate::ports::outbound::{EventPublisher, PublishError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Publishes events as structured log lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish(&self, event: AccountabilityEvent) -> Result<(), PublishError> {
        info!(topic = event.topic(), "[qc-18] {:?}", event);
        Ok(())
    }
}

/// Keeps every published event.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AccountabilityEvent>>,
    disconnected: AtomicBool,
}

impl RecordingPublisher {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of published events.
    pub fn events(&self) -> Vec<AccountabilityEvent> {
        self.events.lock().clone()
    }

    /// Refuse every later event with [`PublishError::NotConnected`].
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    /// Number of events on `topic`.
    pub fn count_on(&self, topic: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.topic() == topic)
            .count()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: AccountabilityEvent) -> Result<(), PublishError> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(PublishError::NotConnected);
        }
        self.events.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::topics;

    #[test]
    fn test_recording_publisher_counts_topics() {
        let publisher = RecordingPublisher::new();
        publisher
            .publish(AccountabilityEvent::EscrowLatched { escrow: [1u8; 20] })
            .unwrap();
        publisher
            .publish(AccountabilityEvent::ShardRotated {
                registry: [2u8; 20],
                rotated_at: 10,
            })
            .unwrap();

        assert_eq!(publisher.events().len(), 2);
        assert_eq!(publisher.count_on(topics::ESCROW), 1);
        assert_eq!(publisher.count_on(topics::LOCK), 0);
    }

    #[test]
    fn test_disconnected_publisher_refuses() {
        let publisher = RecordingPublisher::new();
        publisher.disconnect();
        assert!(matches!(
            publisher.publish(AccountabilityEvent::EscrowLatched { escrow: [1u8; 20] }),
            Err(PublishError::NotConnected)
        ));
        assert!(publisher.events().is_empty());
    }

    #[test]
    fn test_tracing_publisher_accepts_events() {
        assert!(TracingPublisher
            .publish(AccountabilityEvent::EscrowLatched { escrow: [1u8; 20] })
            .is_ok());
    }
}
