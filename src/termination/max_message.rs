//! Stop after a fixed number of messages

use super::{TerminationCondition, TerminationError};
use crate::message::{ChatMessage, StopMessage};
use async_trait::async_trait;

/// Stops once `max_messages` messages have been seen in total
#[derive(Debug, Clone)]
pub struct MaxMessageTermination {
    max_messages: usize,
    message_count: usize,
}

impl MaxMessageTermination {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            message_count: 0,
        }
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }
}

#[async_trait]
impl TerminationCondition for MaxMessageTermination {
    fn terminated(&self) -> bool {
        self.message_count >= self.max_messages
    }

    async fn check(
        &mut self,
        messages: &[ChatMessage],
    ) -> Result<Option<StopMessage>, TerminationError> {
        if self.terminated() {
            return Err(TerminationError::AlreadyTerminated);
        }
        self.message_count += messages.len();
        if self.message_count < self.max_messages {
            return Ok(None);
        }
        Ok(Some(StopMessage::new(
            "MaxMessageTermination",
            format!(
                "Maximal number of messages {} reached, current message count: {}",
                self.max_messages, self.message_count
            ),
        )))
    }

    async fn reset(&mut self) {
        self.message_count = 0;
    }
}
