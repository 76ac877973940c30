//! Effects produced by state transitions

use crate::message::{ChatMessage, ContentPublishEvent, GroupChatEvent, StopMessage, TerminationEvent};
use crate::observer::ObservedEvent;
use crate::topic::TopicId;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append to the session's message thread
    AppendThread { event: ContentPublishEvent },

    /// Publish an event through the transport
    Publish { event: GroupChatEvent, topic: TopicId },

    /// Ask the termination condition about the newest messages
    CheckTermination { messages: Vec<ChatMessage> },

    /// Clear the termination condition after it fired
    ResetTermination,

    /// Ask the speaker selector who goes next
    SelectSpeaker,

    /// Tell observers
    Notify { event: ObservedEvent },
}

impl Effect {
    pub fn append(event: ContentPublishEvent) -> Self {
        Effect::AppendThread { event }
    }

    /// Relay content onto the group topic under the manager's name
    pub fn relay_to_group(event: &ContentPublishEvent, manager: &str, group: TopicId) -> Self {
        Effect::Publish {
            event: GroupChatEvent::ContentPublish(event.republished_by(manager)),
            topic: group,
        }
    }

    pub fn request_content(topic: TopicId) -> Self {
        Effect::Publish {
            event: GroupChatEvent::request(),
            topic,
        }
    }

    pub fn notify_content(session: &str, origin: &str, event: ContentPublishEvent) -> Self {
        Effect::Notify {
            event: ObservedEvent::ContentReceived {
                session: session.to_string(),
                origin: origin.to_string(),
                event,
            },
        }
    }

    pub fn notify_speaker(session: &str, speaker: &str) -> Self {
        Effect::Notify {
            event: ObservedEvent::SpeakerRequested {
                session: session.to_string(),
                speaker: speaker.to_string(),
            },
        }
    }

    pub fn notify_terminated(session: &str, manager: &str, stop: StopMessage) -> Self {
        Effect::Notify {
            event: ObservedEvent::Terminated {
                session: session.to_string(),
                event: TerminationEvent {
                    message: stop,
                    source: manager.to_string(),
                },
            },
        }
    }
}
