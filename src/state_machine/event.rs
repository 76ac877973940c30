//! Events that drive the group chat state machine

use crate::message::{ContentPublishEvent, StopMessage};

/// Events that trigger state transitions
///
/// The first three come from classified deliveries; the last two carry
/// collaborator results back into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Content published on the parent topic
    ParentContent { event: ContentPublishEvent },

    /// Content published on the group topic
    GroupContent { event: ContentPublishEvent },

    /// Content request from outside the group: start (or resume) talking
    StartRequested { origin: String },

    /// Termination condition verdict for the newest group content
    TerminationChecked { stop: Option<StopMessage> },

    /// Speaker selector verdict
    SpeakerSelected { topic_type: String },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ParentContent { .. } => "parent_content",
            Event::GroupContent { .. } => "group_content",
            Event::StartRequested { .. } => "start_requested",
            Event::TerminationChecked { .. } => "termination_checked",
            Event::SpeakerSelected { .. } => "speaker_selected",
        }
    }
}
