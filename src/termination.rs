//! Termination conditions
//!
//! A condition sees each new segment of the thread and decides whether the
//! conversation should stop. Conditions latch: once one has fired it must be
//! reset before it can be checked again.

mod combinators;
mod max_message;
mod stop_message;
mod text_mention;

pub use combinators::{AndTermination, OrTermination};
pub use max_message::MaxMessageTermination;
pub use stop_message::StopMessageTermination;
pub use text_mention::TextMentionTermination;

use crate::message::{ChatMessage, StopMessage};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by termination conditions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminationError {
    #[error("condition already terminated; reset it before checking again")]
    AlreadyTerminated,
    #[error("{0}")]
    Failed(String),
}

/// Decides when a conversation is over
#[async_trait]
pub trait TerminationCondition: Send {
    /// Whether the condition has fired and not been reset since
    fn terminated(&self) -> bool;

    /// Inspect the newest messages. `Some` means stop.
    async fn check(&mut self, messages: &[ChatMessage])
        -> Result<Option<StopMessage>, TerminationError>;

    /// Clear internal state so the condition can be used for another run
    async fn reset(&mut self);
}

#[async_trait]
impl<T: TerminationCondition + ?Sized> TerminationCondition for Box<T> {
    fn terminated(&self) -> bool {
        (**self).terminated()
    }

    async fn check(
        &mut self,
        messages: &[ChatMessage],
    ) -> Result<Option<StopMessage>, TerminationError> {
        (**self).check(messages).await
    }

    async fn reset(&mut self) {
        (**self).reset().await;
    }
}

/// Combine several stop messages into one
fn merge_stop_messages(stops: &[StopMessage]) -> StopMessage {
    let content = stops
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let source = stops
        .iter()
        .map(|s| s.source.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    StopMessage { source, content }
}
