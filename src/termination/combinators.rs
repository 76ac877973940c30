//! Boolean combinations of termination conditions

use super::{merge_stop_messages, TerminationCondition, TerminationError};
use crate::message::{ChatMessage, StopMessage};
use async_trait::async_trait;

/// Stops as soon as any child condition stops
pub struct OrTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl OrTermination {
    pub fn new(conditions: Vec<Box<dyn TerminationCondition>>) -> Self {
        Self { conditions }
    }
}

#[async_trait]
impl TerminationCondition for OrTermination {
    fn terminated(&self) -> bool {
        self.conditions.iter().any(|c| c.terminated())
    }

    async fn check(
        &mut self,
        messages: &[ChatMessage],
    ) -> Result<Option<StopMessage>, TerminationError> {
        if self.terminated() {
            return Err(TerminationError::AlreadyTerminated);
        }
        let mut stops = Vec::new();
        for condition in &mut self.conditions {
            if let Some(stop) = condition.check(messages).await? {
                stops.push(stop);
            }
        }
        if stops.is_empty() {
            Ok(None)
        } else {
            Ok(Some(merge_stop_messages(&stops)))
        }
    }

    async fn reset(&mut self) {
        for condition in &mut self.conditions {
            condition.reset().await;
        }
    }
}

/// Stops once every child condition has stopped
///
/// Children that already fired are not checked again; their stop messages
/// are held until the last child fires.
pub struct AndTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
    stop_messages: Vec<StopMessage>,
}

impl AndTermination {
    pub fn new(conditions: Vec<Box<dyn TerminationCondition>>) -> Self {
        Self {
            conditions,
            stop_messages: Vec::new(),
        }
    }
}

#[async_trait]
impl TerminationCondition for AndTermination {
    fn terminated(&self) -> bool {
        self.conditions.iter().all(|c| c.terminated())
    }

    async fn check(
        &mut self,
        messages: &[ChatMessage],
    ) -> Result<Option<StopMessage>, TerminationError> {
        if self.terminated() {
            return Err(TerminationError::AlreadyTerminated);
        }
        for condition in &mut self.conditions {
            if condition.terminated() {
                continue;
            }
            if let Some(stop) = condition.check(messages).await? {
                self.stop_messages.push(stop);
            }
        }
        if self.terminated() {
            Ok(Some(merge_stop_messages(&self.stop_messages)))
        } else {
            Ok(None)
        }
    }

    async fn reset(&mut self) {
        for condition in &mut self.conditions {
            condition.reset().await;
        }
        self.stop_messages.clear();
    }
}
