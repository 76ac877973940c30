//! Stop when a phrase shows up

use super::{TerminationCondition, TerminationError};
use crate::message::{ChatMessage, StopMessage};
use async_trait::async_trait;

/// Stops when any message content contains `text`
#[derive(Debug, Clone)]
pub struct TextMentionTermination {
    text: String,
    terminated: bool,
}

impl TextMentionTermination {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            terminated: false,
        }
    }
}

#[async_trait]
impl TerminationCondition for TextMentionTermination {
    fn terminated(&self) -> bool {
        self.terminated
    }

    async fn check(
        &mut self,
        messages: &[ChatMessage],
    ) -> Result<Option<StopMessage>, TerminationError> {
        if self.terminated {
            return Err(TerminationError::AlreadyTerminated);
        }
        if messages.iter().any(|m| m.content().contains(&self.text)) {
            self.terminated = true;
            return Ok(Some(StopMessage::new(
                "TextMentionTermination",
                format!("Text '{}' mentioned", self.text),
            )));
        }
        Ok(None)
    }

    async fn reset(&mut self) {
        self.terminated = false;
    }
}
