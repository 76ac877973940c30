//! Topic identities and delivery envelopes

use crate::message::GroupChatEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (topic type, source) pair addressing one channel of one session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicId {
    /// Logical channel: parent, group, or one per participant
    pub topic_type: String,
    /// Conversation session the channel belongs to
    pub source: String,
}

impl TopicId {
    pub fn new(topic_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            topic_type: topic_type.into(),
            source: source.into(),
        }
    }

    /// Same session, different channel
    pub fn sibling(&self, topic_type: impl Into<String>) -> Self {
        Self::new(topic_type, self.source.clone())
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic_type, self.source)
    }
}

/// Metadata the transport attaches to every delivered event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    /// Topic the event arrived on. `None` for direct sends, which the
    /// group chat never accepts.
    pub topic_id: Option<TopicId>,
    /// Agent that published the event, when known
    pub sender: Option<String>,
}

impl MessageContext {
    pub fn on_topic(topic_id: TopicId) -> Self {
        Self {
            topic_id: Some(topic_id),
            sender: None,
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }
}

/// An event as handed over by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub event: GroupChatEvent,
    pub context: MessageContext,
}

impl Delivery {
    pub fn new(event: GroupChatEvent, context: MessageContext) -> Self {
        Self { event, context }
    }

    /// Convenience for a delivery that arrived on `topic_id`
    pub fn on_topic(event: GroupChatEvent, topic_id: TopicId) -> Self {
        Self::new(event, MessageContext::on_topic(topic_id))
    }
}
