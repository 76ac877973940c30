//! Group chat event and message types

use serde::{Deserialize, Serialize};

/// A contribution to the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatMessage {
    /// Ordinary text from a participant or the parent
    Text { source: String, content: String },
    /// A participant asking for the conversation to end
    Stop { source: String, content: String },
}

impl ChatMessage {
    pub fn text(source: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Text {
            source: source.into(),
            content: content.into(),
        }
    }

    pub fn stop(source: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Stop {
            source: source.into(),
            content: content.into(),
        }
    }

    pub fn source(&self) -> &str {
        match self {
            ChatMessage::Text { source, .. } | ChatMessage::Stop { source, .. } => source,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatMessage::Text { content, .. } | ChatMessage::Stop { content, .. } => content,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, ChatMessage::Stop { .. })
    }
}

/// Final message produced by a termination condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopMessage {
    pub source: String,
    pub content: String,
}

impl StopMessage {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

impl From<StopMessage> for ChatMessage {
    fn from(stop: StopMessage) -> Self {
        ChatMessage::Stop {
            source: stop.source,
            content: stop.content,
        }
    }
}

/// Content published to a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPublishEvent {
    pub message: ChatMessage,
    /// Agent that (re)published the content, if any
    #[serde(default)]
    pub publisher: Option<String>,
}

impl ContentPublishEvent {
    pub fn new(message: ChatMessage) -> Self {
        Self {
            message,
            publisher: None,
        }
    }

    /// Same content, republished by `publisher`
    #[must_use]
    pub fn republished_by(&self, publisher: impl Into<String>) -> Self {
        Self {
            message: self.message.clone(),
            publisher: Some(publisher.into()),
        }
    }
}

/// Solicitation asking the receiving participant to contribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequestEvent {}

/// Emitted when a termination condition stops the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationEvent {
    pub message: StopMessage,
    /// Agent that made the decision
    pub source: String,
}

/// Everything that travels over the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupChatEvent {
    ContentPublish(ContentPublishEvent),
    ContentRequest(ContentRequestEvent),
}

impl GroupChatEvent {
    pub fn publish(message: ChatMessage) -> Self {
        GroupChatEvent::ContentPublish(ContentPublishEvent::new(message))
    }

    pub fn request() -> Self {
        GroupChatEvent::ContentRequest(ContentRequestEvent::default())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GroupChatEvent::ContentPublish(_) => "content_publish",
            GroupChatEvent::ContentRequest(_) => "content_request",
        }
    }
}
