//! Classifies deliveries by origin topic

use crate::error::GroupChatError;
use crate::message::GroupChatEvent;
use crate::roster::Roster;
use crate::state_machine::Event;
use crate::topic::{Delivery, TopicId};

/// A delivery that passed routing, ready for the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub topic: TopicId,
    pub event: Event,
}

/// Map a delivery onto a state machine event.
///
/// Content is accepted from the parent and group topics only. Content
/// requests are accepted from anywhere except the group topic.
pub fn classify(delivery: Delivery, roster: &Roster) -> Result<Routed, GroupChatError> {
    let topic = delivery.context.topic_id.ok_or(GroupChatError::MissingTopic)?;

    let event = match delivery.event {
        GroupChatEvent::ContentPublish(event) => {
            if topic.topic_type == roster.parent_topic_type() {
                Event::ParentContent { event }
            } else if topic.topic_type == roster.group_topic_type() {
                Event::GroupContent { event }
            } else {
                return Err(GroupChatError::UnexpectedOrigin {
                    topic_type: topic.topic_type,
                });
            }
        }
        GroupChatEvent::ContentRequest(_) => {
            if topic.topic_type == roster.group_topic_type() {
                return Err(GroupChatError::ProtocolViolation {
                    topic_type: topic.topic_type,
                });
            }
            Event::StartRequested {
                origin: topic.topic_type.clone(),
            }
        }
    };

    Ok(Routed { topic, event })
}
