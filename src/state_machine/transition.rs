//! Pure state transition function

use super::{ChatContext, ChatState, Effect, Event};
use crate::message::ContentPublishEvent;
use crate::topic::TopicId;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("a content request to '{0}' is still outstanding")]
    SolicitationOutstanding(String),
    #[error("conversation has terminated; group content is no longer accepted")]
    ConversationTerminated,
    #[error("selected speaker '{0}' is not a participant")]
    UnknownSpeaker(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Parent content: record and relay, never solicit
        // ============================================================

        // Idle / AwaitingSpeakerReply + ParentContent -> unchanged
        (ChatState::Idle | ChatState::AwaitingSpeakerReply { .. }, Event::ParentContent { event }) => {
            Ok(TransitionResult::new(state.clone()).with_effects(relay_effects(context, event)))
        }

        // Terminated + ParentContent -> Idle (a new run starts)
        (ChatState::Terminated { .. }, Event::ParentContent { event }) => {
            Ok(TransitionResult::new(ChatState::Idle).with_effects(relay_effects(context, event)))
        }

        // ============================================================
        // Group content: record, then check termination or select
        // ============================================================

        (ChatState::Idle, Event::GroupContent { event }) => Ok(group_content(context, event)),

        // Only the awaited speaker may answer while a request is outstanding
        (ChatState::AwaitingSpeakerReply { speaker }, Event::GroupContent { event }) => {
            if event.message.source() != speaker.as_str() {
                return Err(TransitionError::SolicitationOutstanding(speaker.clone()));
            }
            Ok(group_content(context, event))
        }

        (ChatState::Terminated { .. }, Event::GroupContent { .. }) => {
            Err(TransitionError::ConversationTerminated)
        }

        // ============================================================
        // Start requests
        // ============================================================

        (ChatState::Idle | ChatState::Terminated { .. }, Event::StartRequested { .. }) => {
            Ok(TransitionResult::new(ChatState::SelectingSpeaker).with_effect(Effect::SelectSpeaker))
        }

        // Only one solicitation may be outstanding
        (ChatState::AwaitingSpeakerReply { speaker }, Event::StartRequested { .. }) => {
            Err(TransitionError::SolicitationOutstanding(speaker.clone()))
        }

        // ============================================================
        // Collaborator verdicts
        // ============================================================

        // CheckingTermination + stop -> Terminated
        (ChatState::CheckingTermination, Event::TerminationChecked { stop: Some(stop) }) => {
            Ok(TransitionResult::new(ChatState::Terminated { stop: stop.clone() })
                .with_effect(Effect::ResetTermination)
                .with_effect(Effect::notify_terminated(
                    &context.session,
                    &context.manager_name,
                    stop,
                )))
        }

        // CheckingTermination + continue -> SelectingSpeaker
        (ChatState::CheckingTermination, Event::TerminationChecked { stop: None }) => {
            Ok(TransitionResult::new(ChatState::SelectingSpeaker).with_effect(Effect::SelectSpeaker))
        }

        // SelectingSpeaker + SpeakerSelected -> AwaitingSpeakerReply
        (ChatState::SelectingSpeaker, Event::SpeakerSelected { topic_type }) => {
            if !context.roster.contains(&topic_type) {
                return Err(TransitionError::UnknownSpeaker(topic_type));
            }
            let topic = TopicId::new(topic_type.clone(), context.session.clone());
            Ok(TransitionResult::new(ChatState::AwaitingSpeakerReply {
                speaker: topic_type.clone(),
            })
            .with_effect(Effect::request_content(topic))
            .with_effect(Effect::notify_speaker(&context.session, &topic_type)))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "no transition from {} on {}",
            state.name(),
            event.name()
        ))),
    }
}

// Helper functions

fn relay_effects(context: &ChatContext, event: ContentPublishEvent) -> Vec<Effect> {
    let group = TopicId::new(context.roster.group_topic_type(), context.session.clone());
    vec![
        Effect::append(event.clone()),
        Effect::relay_to_group(&event, &context.manager_name, group),
        Effect::notify_content(&context.session, context.roster.parent_topic_type(), event),
    ]
}

fn group_content(context: &ChatContext, event: ContentPublishEvent) -> TransitionResult {
    let group = context.roster.group_topic_type();
    let (next_state, next_effect) = if context.has_termination {
        let messages = vec![event.message.clone()];
        (ChatState::CheckingTermination, Effect::CheckTermination { messages })
    } else {
        (ChatState::SelectingSpeaker, Effect::SelectSpeaker)
    };
    TransitionResult::new(next_state)
        .with_effect(Effect::append(event.clone()))
        .with_effect(Effect::notify_content(&context.session, group, event))
        .with_effect(next_effect)
}
