//! Per-session group chat executor

use super::SessionCommand;
use crate::error::GroupChatError;
use crate::message::ContentPublishEvent;
use crate::observer::{EventObserver, ObservedEvent};
use crate::roster::Roster;
use crate::router::classify;
use crate::selector::SpeakerSelector;
use crate::state_machine::{transition, ChatContext, ChatState, Effect, Event};
use crate::termination::TerminationCondition;
use crate::topic::Delivery;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One conversation: owns the thread, the state, and the strategies
///
/// Every delivery is handled to completion before the next one starts, so
/// the selector and termination condition always see a consistent thread.
pub struct GroupChat<T: Transport + 'static> {
    context: ChatContext,
    state: ChatState,
    thread: Vec<ContentPublishEvent>,
    selector: Box<dyn SpeakerSelector>,
    termination: Option<Box<dyn TerminationCondition>>,
    transport: Arc<T>,
    observers: Vec<Arc<dyn EventObserver>>,
    /// Notifications held back until the current delivery commits
    pending_notifications: Vec<ObservedEvent>,
}

impl<T: Transport + 'static> GroupChat<T> {
    pub fn new(
        session: impl Into<String>,
        roster: Arc<Roster>,
        manager_name: impl Into<String>,
        selector: Box<dyn SpeakerSelector>,
        termination: Option<Box<dyn TerminationCondition>>,
        transport: Arc<T>,
    ) -> Self {
        let context = ChatContext::new(session, roster, manager_name, termination.is_some());
        Self {
            context,
            state: ChatState::Idle,
            thread: Vec::new(),
            selector,
            termination,
            transport,
            observers: Vec::new(),
            pending_notifications: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn session(&self) -> &str {
        &self.context.session
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn thread(&self) -> &[ContentPublishEvent] {
        &self.thread
    }

    /// Process mailbox commands until every sender is dropped
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        tracing::info!(session = %self.context.session, "Starting group chat session");

        while let Some(SessionCommand { delivery, reply }) = commands.recv().await {
            let result = self.handle(delivery).await;
            match reply {
                Some(reply) => {
                    // Caller may have given up waiting
                    let _ = reply.send(result);
                }
                None => {
                    if let Err(e) = result {
                        tracing::error!(session = %self.context.session, error = %e, "Error handling delivery");
                    }
                }
            }
        }

        tracing::info!(
            session = %self.context.session,
            thread_len = self.thread.len(),
            state = self.state.name(),
            "Group chat session stopped"
        );
    }

    /// Handle one delivery from the transport
    pub async fn handle(&mut self, delivery: Delivery) -> Result<(), GroupChatError> {
        let result = self.route_and_process(delivery).await;
        if let Err(e) = &result {
            self.notify(&ObservedEvent::Error {
                session: self.context.session.clone(),
                message: e.to_string(),
            });
        }
        result
    }

    async fn route_and_process(&mut self, delivery: Delivery) -> Result<(), GroupChatError> {
        let routed = classify(delivery, &self.context.roster)?;
        if routed.topic.source != self.context.session {
            return Err(GroupChatError::WrongSession {
                expected: self.context.session.clone(),
                actual: routed.topic.source,
            });
        }
        self.process_event(routed.event).await
    }

    /// Apply an event and everything it triggers, or nothing at all
    async fn process_event(&mut self, event: Event) -> Result<(), GroupChatError> {
        let saved_state = self.state.clone();
        let saved_len = self.thread.len();

        let result = self.apply(event).await;
        let notifications = std::mem::take(&mut self.pending_notifications);
        match &result {
            Ok(()) => {
                for event in &notifications {
                    self.notify(event);
                }
            }
            Err(_) => {
                tracing::debug!(
                    session = %self.context.session,
                    dropped = self.thread.len() - saved_len,
                    "Rolling back failed delivery"
                );
                self.state = saved_state;
                self.thread.truncate(saved_len);
            }
        }
        result
    }

    async fn apply(&mut self, event: Event) -> Result<(), GroupChatError> {
        // Collaborator results come back as events; loop until none are left
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();
            let result = transition(&self.state, &self.context, current_event)?;

            tracing::debug!(
                session = %self.context.session,
                event = event_name,
                from = self.state.name(),
                to = result.new_state.name(),
                "Transition"
            );
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await? {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    async fn execute_effect(&mut self, effect: Effect) -> Result<Option<Event>, GroupChatError> {
        match effect {
            Effect::AppendThread { event } => {
                self.thread.push(event);
                Ok(None)
            }

            Effect::Publish { event, topic } => {
                tracing::debug!(
                    session = %self.context.session,
                    topic = %topic,
                    kind = event.kind(),
                    "Publishing"
                );
                self.transport
                    .publish(&self.context.manager_name, event, topic)
                    .await?;
                Ok(None)
            }

            Effect::CheckTermination { messages } => {
                let stop = match &mut self.termination {
                    Some(condition) => condition.check(&messages).await?,
                    None => None,
                };
                Ok(Some(Event::TerminationChecked { stop }))
            }

            Effect::ResetTermination => {
                if let Some(condition) = &mut self.termination {
                    condition.reset().await;
                }
                Ok(None)
            }

            Effect::SelectSpeaker => {
                let topic_type = self.selector.select_speaker(&self.thread).await?;
                tracing::info!(
                    session = %self.context.session,
                    speaker = %topic_type,
                    thread_len = self.thread.len(),
                    "Selected next speaker"
                );
                Ok(Some(Event::SpeakerSelected { topic_type }))
            }

            Effect::Notify { event } => {
                self.pending_notifications.push(event);
                Ok(None)
            }
        }
    }

    fn notify(&self, event: &ObservedEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
