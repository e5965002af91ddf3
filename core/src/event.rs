use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::diag::Diagnostic;

/// Outbound notifications of an editing session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Full replacement diagnostics list of one validation pass.
    Diagnostics(Arc<[Diagnostic]>),
    /// Summary line for the same pass.
    Status(String),
    /// Identifiers visible at the caret after a re-analysis.
    ContextChanged(Arc<BTreeSet<String>>),
}

/// Publish/subscribe channel shared by the session and its scheduler.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Deliver `event` to current subscribers. Having none is not an error.
    pub fn publish(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("event dropped, no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
