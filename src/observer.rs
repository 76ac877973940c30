//! Observation hooks
//!
//! Observers see what the group chat does without being able to change it.
//! A group chat with no observers behaves exactly like one with many.

use crate::message::{ContentPublishEvent, TerminationEvent};
use serde::Serialize;
use tokio::sync::broadcast;

/// Something worth telling the outside world about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObservedEvent {
    /// Content arrived from the parent or the group
    ContentReceived {
        session: String,
        origin: String,
        event: ContentPublishEvent,
    },
    /// A participant was asked to speak
    SpeakerRequested { session: String, speaker: String },
    /// The termination condition stopped the conversation
    Terminated {
        session: String,
        event: TerminationEvent,
    },
    /// Handling a delivery failed
    Error { session: String, message: String },
}

impl ObservedEvent {
    pub fn session(&self) -> &str {
        match self {
            ObservedEvent::ContentReceived { session, .. }
            | ObservedEvent::SpeakerRequested { session, .. }
            | ObservedEvent::Terminated { session, .. }
            | ObservedEvent::Error { session, .. } => session,
        }
    }
}

/// Receives every [`ObservedEvent`]
pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &ObservedEvent);
}

/// Writes events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn on_event(&self, event: &ObservedEvent) {
        match event {
            ObservedEvent::Error { session, message } => {
                tracing::warn!(session = %session, error = %message, "Group chat error");
            }
            ObservedEvent::Terminated { session, event } => {
                tracing::info!(
                    session = %session,
                    reason = %event.message.content,
                    "Group chat terminated"
                );
            }
            _ => {
                let payload = serde_json::to_string(event).unwrap_or_default();
                tracing::debug!(session = %event.session(), event = %payload, "Group chat event");
            }
        }
    }
}

/// Fans events out to broadcast subscribers
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<ObservedEvent>,
}

impl BroadcastObserver {
    pub fn new(tx: broadcast::Sender<ObservedEvent>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ObservedEvent> {
        self.tx.subscribe()
    }
}

impl EventObserver for BroadcastObserver {
    fn on_event(&self, event: &ObservedEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event.clone());
    }
}
