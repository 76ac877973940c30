//! Speaker selection strategies

use crate::message::ContentPublishEvent;
use crate::roster::Roster;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while choosing the next speaker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no participants to select from")]
    NoParticipants,
    #[error("{0}")]
    Failed(String),
}

/// Chooses which participant speaks next
///
/// Implementations must return a topic type present in the roster; the
/// group chat rejects anything else as a contract violation.
#[async_trait]
pub trait SpeakerSelector: Send {
    async fn select_speaker(
        &mut self,
        thread: &[ContentPublishEvent],
    ) -> Result<String, SelectionError>;
}

#[async_trait]
impl<T: SpeakerSelector + ?Sized> SpeakerSelector for Box<T> {
    async fn select_speaker(
        &mut self,
        thread: &[ContentPublishEvent],
    ) -> Result<String, SelectionError> {
        (**self).select_speaker(thread).await
    }
}

/// Cycles through participants in roster order
#[derive(Debug, Clone)]
pub struct RoundRobinSelector {
    topic_types: Vec<String>,
    next_index: usize,
}

impl RoundRobinSelector {
    pub fn new(roster: &Roster) -> Self {
        Self {
            topic_types: roster.topic_types().map(str::to_string).collect(),
            next_index: 0,
        }
    }
}

#[async_trait]
impl SpeakerSelector for RoundRobinSelector {
    async fn select_speaker(
        &mut self,
        _thread: &[ContentPublishEvent],
    ) -> Result<String, SelectionError> {
        let speaker = self
            .topic_types
            .get(self.next_index)
            .cloned()
            .ok_or(SelectionError::NoParticipants)?;
        self.next_index = (self.next_index + 1) % self.topic_types.len();
        Ok(speaker)
    }
}

/// Adapts a closure over the thread into a selector
pub struct FnSelector<F> {
    select: F,
}

impl<F> FnSelector<F>
where
    F: FnMut(&[ContentPublishEvent]) -> String + Send,
{
    pub fn new(select: F) -> Self {
        Self { select }
    }
}

#[async_trait]
impl<F> SpeakerSelector for FnSelector<F>
where
    F: FnMut(&[ContentPublishEvent]) -> String + Send,
{
    async fn select_speaker(
        &mut self,
        thread: &[ContentPublishEvent],
    ) -> Result<String, SelectionError> {
        Ok((self.select)(thread))
    }
}
