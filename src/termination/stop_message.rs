//! Stop when a participant says so

use super::{TerminationCondition, TerminationError};
use crate::message::{ChatMessage, StopMessage};
use async_trait::async_trait;

/// Stops when any message is a [`ChatMessage::Stop`]
#[derive(Debug, Clone, Default)]
pub struct StopMessageTermination {
    terminated: bool,
}

impl StopMessageTermination {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TerminationCondition for StopMessageTermination {
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
        if messages.iter().any(ChatMessage::is_stop) {
            self.terminated = true;
            return Ok(Some(StopMessage::new(
                "StopMessageTermination",
                "Stop message received",
            )));
        }
        Ok(None)
    }

    async fn reset(&mut self) {
        self.terminated = false;
    }
}
