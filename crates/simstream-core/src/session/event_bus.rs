//! Session event bus
//!
//! Fans session events out to an optional subscriber.

use tokio::sync::mpsc;

use super::events::SessionEvent;

/// Event bus for session events
#[derive(Default)]
pub struct SessionEventBus {
    subscriber: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start delivering events to a new receiver, replacing any previous one
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriber = Some(tx);
        rx
    }

    /// Emit an event (always logged via tracing)
    pub fn emit(&mut self, event: SessionEvent) {
        tracing::debug!("Session event: {:?}", event);
        if let Some(tx) = &self.subscriber {
            if tx.send(event).is_err() {
                tracing::debug!("Session event receiver dropped");
                self.subscriber = None;
            }
        }
    }
}
