//! Group chat configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PARENT_TOPIC: &str = "parent";
pub const DEFAULT_GROUP_TOPIC: &str = "group_chat";
pub const DEFAULT_MANAGER_NAME: &str = "group_chat_manager";
pub const DEFAULT_MAILBOX_CAPACITY: usize = 32;

/// Topic wiring and runtime sizing for a group chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupChatConfig {
    pub parent_topic_type: String,
    pub group_topic_type: String,
    /// Name the manager publishes under
    pub manager_name: String,
    /// Queue depth of each session's mailbox
    pub mailbox_capacity: usize,
}

impl Default for GroupChatConfig {
    fn default() -> Self {
        Self {
            parent_topic_type: DEFAULT_PARENT_TOPIC.to_string(),
            group_topic_type: DEFAULT_GROUP_TOPIC.to_string(),
            manager_name: DEFAULT_MANAGER_NAME.to_string(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl GroupChatConfig {
    /// Read overrides from `CHORUS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            mailbox_capacity: positive_setting(
                "CHORUS_MAILBOX_CAPACITY",
                lookup("CHORUS_MAILBOX_CAPACITY"),
                defaults.mailbox_capacity,
            )?,
            parent_topic_type: lookup("CHORUS_PARENT_TOPIC").unwrap_or(defaults.parent_topic_type),
            group_topic_type: lookup("CHORUS_GROUP_TOPIC").unwrap_or(defaults.group_topic_type),
            manager_name: lookup("CHORUS_MANAGER_NAME").unwrap_or(defaults.manager_name),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check settings that struct literals and deserialization can get wrong
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "mailbox_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_topics(
        mut self,
        parent_topic_type: impl Into<String>,
        group_topic_type: impl Into<String>,
    ) -> Self {
        self.parent_topic_type = parent_topic_type.into();
        self.group_topic_type = group_topic_type.into();
        self
    }
}

/// Read a positive integer from the environment variable `name`
pub fn positive_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    positive_setting(name, std::env::var(name).ok(), default)
}

fn positive_setting(
    name: &'static str,
    raw: Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<usize>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidSetting {
            name,
            reason: format!("expected a positive integer, got '{raw}'"),
        }),
        Ok(n) => Ok(n),
    }
}
