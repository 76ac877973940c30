//! Runtime for executing group chats
//!
//! One [`GroupChat`] actor runs per session `source`. Deliveries for a
//! session queue in its mailbox and are handled strictly in order, while
//! different sessions proceed in parallel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::GroupChat;

use crate::config::GroupChatConfig;
use crate::error::{ConfigError, GroupChatError};
use crate::observer::{BroadcastObserver, EventObserver, ObservedEvent, TracingObserver};
use crate::roster::Roster;
use crate::selector::SpeakerSelector;
use crate::termination::TerminationCondition;
use crate::topic::Delivery;
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Builds a fresh selector for each session
pub type SelectorFactory = Arc<dyn Fn(&Roster) -> Box<dyn SpeakerSelector> + Send + Sync>;

/// Builds a fresh termination condition for each session
pub type TerminationFactory = Arc<dyn Fn() -> Box<dyn TerminationCondition> + Send + Sync>;

/// A unit of work for a session's mailbox
pub struct SessionCommand {
    pub delivery: Delivery,
    /// Where to send the outcome; `None` means log it instead
    pub reply: Option<oneshot::Sender<Result<(), GroupChatError>>>,
}

/// Validated recipe for starting group chat sessions
#[derive(Clone)]
pub struct GroupChatTemplate {
    config: GroupChatConfig,
    roster: Arc<Roster>,
    selector: SelectorFactory,
    termination: Option<TerminationFactory>,
}

impl GroupChatTemplate {
    /// Validate the settings and the roster against the configured topics
    pub fn new<S, D, F>(
        config: GroupChatConfig,
        participant_topic_types: impl IntoIterator<Item = S>,
        participant_descriptions: impl IntoIterator<Item = D>,
        selector: F,
    ) -> Result<Self, ConfigError>
    where
        S: Into<String>,
        D: Into<String>,
        F: Fn(&Roster) -> Box<dyn SpeakerSelector> + Send + Sync + 'static,
    {
        config.validate()?;
        let roster = Roster::new(
            config.parent_topic_type.clone(),
            config.group_topic_type.clone(),
            participant_topic_types,
            participant_descriptions,
        )?;
        Ok(Self {
            config,
            roster: Arc::new(roster),
            selector: Arc::new(selector),
            termination: None,
        })
    }

    #[must_use]
    pub fn with_termination<F>(mut self, termination: F) -> Self
    where
        F: Fn() -> Box<dyn TerminationCondition> + Send + Sync + 'static,
    {
        self.termination = Some(Arc::new(termination));
        self
    }

    pub fn config(&self) -> &GroupChatConfig {
        &self.config
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    /// A new group chat for `session` with fresh strategies
    pub fn instantiate<T: Transport + 'static>(
        &self,
        session: &str,
        transport: Arc<T>,
    ) -> GroupChat<T> {
        GroupChat::new(
            session,
            self.roster.clone(),
            self.config.manager_name.clone(),
            (self.selector)(self.roster.as_ref()),
            self.termination.as_ref().map(|factory| factory()),
            transport,
        )
    }
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
}

/// Manager for all group chat sessions
///
/// Sessions are never closed implicitly. A terminated session keeps its actor
/// and table entry so that later parent content can start a new run on the
/// same thread; callers that are done with a session call
/// [`SessionManager::close_session`] to release it.
pub struct SessionManager<T: Transport + 'static> {
    template: GroupChatTemplate,
    transport: Arc<T>,
    observers: Vec<Arc<dyn EventObserver>>,
    broadcast: BroadcastObserver,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl<T: Transport + 'static> SessionManager<T> {
    pub fn new(template: GroupChatTemplate, transport: Arc<T>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(128);
        let broadcast = BroadcastObserver::new(broadcast_tx);
        let observers: Vec<Arc<dyn EventObserver>> =
            vec![Arc::new(TracingObserver), Arc::new(broadcast.clone())];
        Self {
            template,
            transport,
            observers,
            broadcast,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Add an observer for sessions started after this call
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Subscribe to events from every session
    pub fn subscribe(&self) -> broadcast::Receiver<ObservedEvent> {
        self.broadcast.subscribe()
    }

    /// Hand a delivery to its session and wait for the outcome
    pub async fn deliver(&self, delivery: Delivery) -> Result<(), GroupChatError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let source = self.enqueue(delivery, Some(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| GroupChatError::SessionClosed(source))?
    }

    /// Hand a delivery to its session without waiting; failures are logged
    /// and broadcast by the session itself
    pub async fn dispatch(&self, delivery: Delivery) -> Result<(), GroupChatError> {
        self.enqueue(delivery, None).await.map(|_| ())
    }

    /// Feed every delivery from `deliveries` to its session
    pub async fn pump(self: Arc<Self>, mut deliveries: mpsc::Receiver<Delivery>) {
        while let Some(delivery) = deliveries.recv().await {
            if let Err(e) = self.dispatch(delivery).await {
                tracing::warn!(error = %e, "Dropping undeliverable event");
            }
        }
        tracing::info!("Delivery pump stopped");
    }

    /// Sources of all running sessions
    pub async fn sessions(&self) -> Vec<String> {
        let mut sources: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        sources.sort();
        sources
    }

    /// Stop a session once its queued work drains. Returns whether it existed.
    pub async fn close_session(&self, source: &str) -> bool {
        let removed = self.sessions.write().await.remove(source).is_some();
        if removed {
            tracing::info!(session = %source, "Closing group chat session");
        }
        removed
    }

    async fn enqueue(
        &self,
        delivery: Delivery,
        reply: Option<oneshot::Sender<Result<(), GroupChatError>>>,
    ) -> Result<String, GroupChatError> {
        let source = delivery
            .context
            .topic_id
            .as_ref()
            .map(|topic| topic.source.clone())
            .ok_or(GroupChatError::MissingTopic)?;

        let handle = self.get_or_create(&source).await;
        if handle
            .command_tx
            .send(SessionCommand { delivery, reply })
            .await
            .is_err()
        {
            self.sessions.write().await.remove(&source);
            return Err(GroupChatError::SessionClosed(source));
        }
        Ok(source)
    }

    /// Get or start the session for `source`
    async fn get_or_create(&self, source: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(source) {
            return handle.clone();
        }

        let mut sessions = self.sessions.write().await;
        // Another delivery may have started it while we waited for the lock
        if let Some(handle) = sessions.get(source) {
            return handle.clone();
        }

        let (command_tx, command_rx) = mpsc::channel(self.template.config().mailbox_capacity);
        let mut chat = self.template.instantiate(source, self.transport.clone());
        for observer in &self.observers {
            chat = chat.with_observer(observer.clone());
        }

        let session = source.to_string();
        tokio::spawn(async move {
            chat.run(command_rx).await;
            tracing::debug!(session = %session, "Session task finished");
        });

        let handle = SessionHandle { command_tx };
        sessions.insert(source.to_string(), handle.clone());
        handle
    }
}
