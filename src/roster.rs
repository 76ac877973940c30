//! Participant roster and construction-time topic checks

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One addressable member of the group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub topic_type: String,
    pub description: String,
}

/// Validated, immutable set of topics a group chat works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    parent_topic_type: String,
    group_topic_type: String,
    participants: Vec<Participant>,
}

impl Roster {
    /// Build a roster, rejecting any topic layout the group chat cannot route.
    ///
    /// Participant topic types must be unique and distinct from both the
    /// group and parent topic types, which must differ from each other.
    /// Descriptions pair with topic types by position.
    pub fn new<S, D>(
        parent_topic_type: impl Into<String>,
        group_topic_type: impl Into<String>,
        participant_topic_types: impl IntoIterator<Item = S>,
        participant_descriptions: impl IntoIterator<Item = D>,
    ) -> Result<Self, ConfigError>
    where
        S: Into<String>,
        D: Into<String>,
    {
        let parent_topic_type = parent_topic_type.into();
        let group_topic_type = group_topic_type.into();
        let topic_types: Vec<String> = participant_topic_types.into_iter().map(Into::into).collect();
        let descriptions: Vec<String> =
            participant_descriptions.into_iter().map(Into::into).collect();

        if topic_types.len() != descriptions.len() {
            return Err(ConfigError::DescriptionCountMismatch {
                topic_types: topic_types.len(),
                descriptions: descriptions.len(),
            });
        }

        let mut seen = HashSet::new();
        for topic_type in &topic_types {
            if !seen.insert(topic_type.as_str()) {
                return Err(ConfigError::DuplicateParticipant(topic_type.clone()));
            }
        }
        if seen.contains(group_topic_type.as_str()) {
            return Err(ConfigError::GroupTopicIsParticipant(group_topic_type));
        }
        if seen.contains(parent_topic_type.as_str()) {
            return Err(ConfigError::ParentTopicIsParticipant(parent_topic_type));
        }
        if group_topic_type == parent_topic_type {
            return Err(ConfigError::GroupTopicIsParent(group_topic_type));
        }

        let participants = topic_types
            .into_iter()
            .zip(descriptions)
            .map(|(topic_type, description)| Participant {
                topic_type,
                description,
            })
            .collect();

        Ok(Self {
            parent_topic_type,
            group_topic_type,
            participants,
        })
    }

    /// Build from (topic type, description) pairs
    pub fn from_participants(
        parent_topic_type: impl Into<String>,
        group_topic_type: impl Into<String>,
        participants: impl IntoIterator<Item = Participant>,
    ) -> Result<Self, ConfigError> {
        let (topic_types, descriptions): (Vec<_>, Vec<_>) = participants
            .into_iter()
            .map(|p| (p.topic_type, p.description))
            .unzip();
        Self::new(parent_topic_type, group_topic_type, topic_types, descriptions)
    }

    pub fn parent_topic_type(&self) -> &str {
        &self.parent_topic_type
    }

    pub fn group_topic_type(&self) -> &str {
        &self.group_topic_type
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn topic_types(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|p| p.topic_type.as_str())
    }

    pub fn contains(&self, topic_type: &str) -> bool {
        self.participants.iter().any(|p| p.topic_type == topic_type)
    }

    pub fn description(&self, topic_type: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.topic_type == topic_type)
            .map(|p| p.description.as_str())
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
