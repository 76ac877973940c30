//! Group chat error types

use crate::selector::SelectionError;
use crate::state_machine::TransitionError;
use crate::termination::TerminationError;
use crate::transport::TransportError;
use thiserror::Error;

/// Roster or topic invariant violated while building a group chat
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("got {topic_types} participant topic types but {descriptions} descriptions")]
    DescriptionCountMismatch {
        topic_types: usize,
        descriptions: usize,
    },
    #[error("participant topic type '{0}' appears more than once")]
    DuplicateParticipant(String),
    #[error("group topic type '{0}' must not be a participant topic type")]
    GroupTopicIsParticipant(String),
    #[error("parent topic type '{0}' must not be a participant topic type")]
    ParentTopicIsParticipant(String),
    #[error("group and parent topic types are both '{0}'")]
    GroupTopicIsParent(String),
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// Errors reported while handling a delivered event
#[derive(Debug, Error)]
pub enum GroupChatError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// An event kind arrived on a topic that may never carry it
    #[error("content request from the group topic '{topic_type}' is not allowed")]
    ProtocolViolation { topic_type: String },

    /// Content arrived on a topic that is neither parent nor group
    #[error("content published on unexpected topic '{topic_type}'")]
    UnexpectedOrigin { topic_type: String },

    /// The transport delivered an event without a topic identity
    #[error("delivered event carries no topic identity")]
    MissingTopic,

    /// A delivery for one session reached another session's group chat
    #[error("delivery for session '{actual}' reached session '{expected}'")]
    WrongSession { expected: String, actual: String },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("termination condition failed: {0}")]
    Termination(#[from] TerminationError),

    #[error("speaker selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session's actor has stopped and can no longer take events
    #[error("session '{0}' is not running")]
    SessionClosed(String),
}

impl GroupChatError {
    /// True when the error comes from a misbehaving injected strategy
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            GroupChatError::Transition(TransitionError::UnknownSpeaker(_))
        )
    }
}
