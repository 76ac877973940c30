//! Publish/subscribe transport abstraction
//!
//! The group chat only ever publishes; deliveries reach it through
//! [`crate::runtime::SessionManager`].

use crate::message::GroupChatEvent;
use crate::topic::{Delivery, MessageContext, TopicId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("agent '{0}' is not registered")]
    UnknownAgent(String),
    #[error("publish to {topic} failed: {reason}")]
    PublishFailed { topic: String, reason: String },
}

/// Outbound side of the pub/sub fabric
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish `event` to every subscriber of `topic` except `sender`
    async fn publish(
        &self,
        sender: &str,
        event: GroupChatEvent,
        topic: TopicId,
    ) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn publish(
        &self,
        sender: &str,
        event: GroupChatEvent,
        topic: TopicId,
    ) -> Result<(), TransportError> {
        (**self).publish(sender, event, topic).await
    }
}

// ============================================================================
// In-memory bus
// ============================================================================

/// Process-local pub/sub bus
///
/// Each agent registers one mailbox and subscribes it to any number of topic
/// types. Subscriptions match on topic type for every session; the session
/// `source` travels in the delivery context.
#[derive(Default)]
pub struct InMemoryBus {
    mailboxes: RwLock<HashMap<String, mpsc::Sender<Delivery>>>,
    subscriptions: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mailbox for `agent`, replacing any previous one
    pub async fn register(&self, agent: &str, capacity: usize) -> mpsc::Receiver<Delivery> {
        let (tx, rx) = mpsc::channel(capacity);
        self.mailboxes.write().await.insert(agent.to_string(), tx);
        rx
    }

    /// Route `topic_type` to `agent`'s mailbox
    pub async fn subscribe(&self, agent: &str, topic_type: &str) -> Result<(), TransportError> {
        if !self.mailboxes.read().await.contains_key(agent) {
            return Err(TransportError::UnknownAgent(agent.to_string()));
        }
        let mut subscriptions = self.subscriptions.write().await;
        let subscribers = subscriptions.entry(topic_type.to_string()).or_default();
        if !subscribers.iter().any(|s| s == agent) {
            subscribers.push(agent.to_string());
        }
        Ok(())
    }

    /// Agents currently subscribed to `topic_type`
    pub async fn subscribers(&self, topic_type: &str) -> Vec<String> {
        self.subscriptions
            .read()
            .await
            .get(topic_type)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for InMemoryBus {
    async fn publish(
        &self,
        sender: &str,
        event: GroupChatEvent,
        topic: TopicId,
    ) -> Result<(), TransportError> {
        // Collect targets first so no lock is held across a send
        let targets: Vec<(String, mpsc::Sender<Delivery>)> = {
            let subscriptions = self.subscriptions.read().await;
            let mailboxes = self.mailboxes.read().await;
            subscriptions
                .get(&topic.topic_type)
                .into_iter()
                .flatten()
                .filter(|agent| agent.as_str() != sender)
                .filter_map(|agent| mailboxes.get(agent).map(|tx| (agent.clone(), tx.clone())))
                .collect()
        };

        if targets.is_empty() {
            tracing::debug!(topic = %topic, kind = event.kind(), "Published with no subscribers");
        }

        for (agent, tx) in targets {
            let context = MessageContext::on_topic(topic.clone()).with_sender(sender);
            tx.send(Delivery::new(event.clone(), context))
                .await
                .map_err(|_| TransportError::PublishFailed {
                    topic: topic.to_string(),
                    reason: format!("mailbox of '{agent}' is closed"),
                })?;
        }
        Ok(())
    }
}
