//! Group chat state types

use crate::message::StopMessage;
use crate::roster::Roster;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where a session's conversation stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// No solicitation outstanding
    #[default]
    Idle,

    /// Group content appended, waiting on the termination condition
    CheckingTermination,

    /// Waiting on the speaker selector
    SelectingSpeaker,

    /// A content request went to exactly one participant
    AwaitingSpeakerReply { speaker: String },

    /// The termination condition stopped the conversation
    Terminated { stop: StopMessage },
}

impl ChatState {
    /// States that only exist while a single delivery is being handled
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChatState::CheckingTermination | ChatState::SelectingSpeaker
        )
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, ChatState::Terminated { .. })
    }

    /// Participant currently asked to speak, if any
    pub fn outstanding_speaker(&self) -> Option<&str> {
        match self {
            ChatState::AwaitingSpeakerReply { speaker } => Some(speaker),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatState::Idle => "idle",
            ChatState::CheckingTermination => "checking_termination",
            ChatState::SelectingSpeaker => "selecting_speaker",
            ChatState::AwaitingSpeakerReply { .. } => "awaiting_speaker_reply",
            ChatState::Terminated { .. } => "terminated",
        }
    }
}

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct ChatContext {
    /// Session `source` shared by every topic of this conversation
    pub session: String,
    pub roster: Arc<Roster>,
    /// Name the manager publishes under
    pub manager_name: String,
    /// Whether group content goes through a termination check first
    pub has_termination: bool,
}

impl ChatContext {
    pub fn new(
        session: impl Into<String>,
        roster: Arc<Roster>,
        manager_name: impl Into<String>,
        has_termination: bool,
    ) -> Self {
        Self {
            session: session.into(),
            roster,
            manager_name: manager_name.into(),
            has_termination,
        }
    }
}
