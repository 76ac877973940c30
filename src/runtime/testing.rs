//! Mock implementations for testing
//!
//! These mocks enable integration testing without a real transport.

use crate::message::{ChatMessage, ContentPublishEvent, GroupChatEvent, StopMessage};
use crate::observer::{EventObserver, ObservedEvent};
use crate::selector::{SelectionError, SpeakerSelector};
use crate::termination::{TerminationCondition, TerminationError};
use crate::topic::TopicId;
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording Transport
// ============================================================================

/// One call to [`Transport::publish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub sender: String,
    pub event: GroupChatEvent,
    pub topic: TopicId,
}

/// Transport that records publishes instead of delivering them
#[derive(Default)]
pub struct RecordingTransport {
    published: Mutex<Vec<Published>>,
    failing_topics: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make publishes to `topic_type` fail
    pub fn fail_on(&self, topic_type: &str) {
        self.failing_topics
            .lock()
            .unwrap()
            .insert(topic_type.to_string());
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    /// Targets of every content request, in order
    pub fn requests(&self) -> Vec<TopicId> {
        self.published()
            .into_iter()
            .filter(|p| matches!(p.event, GroupChatEvent::ContentRequest(_)))
            .map(|p| p.topic)
            .collect()
    }

    /// Every content publish, in order
    pub fn relays(&self) -> Vec<(ContentPublishEvent, TopicId)> {
        self.published()
            .into_iter()
            .filter_map(|p| match p.event {
                GroupChatEvent::ContentPublish(event) => Some((event, p.topic)),
                GroupChatEvent::ContentRequest(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(
        &self,
        sender: &str,
        event: GroupChatEvent,
        topic: TopicId,
    ) -> Result<(), TransportError> {
        if self.failing_topics.lock().unwrap().contains(&topic.topic_type) {
            return Err(TransportError::PublishFailed {
                topic: topic.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        self.published.lock().unwrap().push(Published {
            sender: sender.to_string(),
            event,
            topic,
        });
        Ok(())
    }
}

// ============================================================================
// Scripted Selector
// ============================================================================

/// Selector that returns queued answers and records every thread it sees
///
/// Clones share state, so a test can keep one clone for inspection.
#[derive(Clone, Default)]
pub struct ScriptedSelector {
    answers: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<Mutex<Vec<Vec<ContentPublishEvent>>>>,
}

#[allow(dead_code)]
impl ScriptedSelector {
    pub fn new<'a>(answers: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().map(str::to_string).collect())),
            calls: Arc::default(),
        }
    }

    /// Thread snapshots passed to each call
    pub fn calls(&self) -> Vec<Vec<ContentPublishEvent>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeakerSelector for ScriptedSelector {
    async fn select_speaker(
        &mut self,
        thread: &[ContentPublishEvent],
    ) -> Result<String, SelectionError> {
        self.calls.lock().unwrap().push(thread.to_vec());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SelectionError::Failed("no scripted answer queued".to_string()))
    }
}

// ============================================================================
// Scripted Termination
// ============================================================================

#[derive(Default)]
struct TerminationLog {
    checks: Vec<Vec<ChatMessage>>,
    resets: usize,
    terminated: bool,
}

/// Termination condition that stops on a chosen check
///
/// Clones share state, so a test can keep one clone for inspection.
#[derive(Clone, Default)]
pub struct ScriptedTermination {
    /// 1-based check number that stops the conversation; 0 never stops
    stop_on_check: usize,
    log: Arc<Mutex<TerminationLog>>,
}

#[allow(dead_code)]
impl ScriptedTermination {
    pub fn stop_on(check: usize) -> Self {
        Self {
            stop_on_check: check,
            log: Arc::default(),
        }
    }

    pub fn never() -> Self {
        Self::stop_on(0)
    }

    pub fn checks(&self) -> Vec<Vec<ChatMessage>> {
        self.log.lock().unwrap().checks.clone()
    }

    pub fn resets(&self) -> usize {
        self.log.lock().unwrap().resets
    }
}

#[async_trait]
impl TerminationCondition for ScriptedTermination {
    fn terminated(&self) -> bool {
        self.log.lock().unwrap().terminated
    }

    async fn check(
        &mut self,
        messages: &[ChatMessage],
    ) -> Result<Option<StopMessage>, TerminationError> {
        let mut log = self.log.lock().unwrap();
        if log.terminated {
            return Err(TerminationError::AlreadyTerminated);
        }
        log.checks.push(messages.to_vec());
        if log.checks.len() == self.stop_on_check {
            log.terminated = true;
            return Ok(Some(StopMessage::new(
                "ScriptedTermination",
                format!("stopped on check {}", self.stop_on_check),
            )));
        }
        Ok(None)
    }

    async fn reset(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.resets += 1;
        log.terminated = false;
        log.checks.clear();
    }
}

// ============================================================================
// Recording Observer
// ============================================================================

/// Observer that keeps everything it sees
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

#[allow(dead_code)]
impl RecordingObserver {
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventObserver for RecordingObserver {
    fn on_event(&self, event: &ObservedEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupChatConfig;
    use crate::error::GroupChatError;
    use crate::roster::Roster;
    use crate::runtime::{GroupChat, GroupChatTemplate, SessionManager};
    use crate::selector::RoundRobinSelector;
    use crate::state_machine::{ChatState, TransitionError};
    use crate::termination::MaxMessageTermination;
    use crate::topic::{Delivery, MessageContext};
    use crate::transport::InMemoryBus;
    use std::time::Duration;

    const SESSION: &str = "s1";

    fn roster() -> Arc<Roster> {
        Arc::new(
            Roster::new(
                "main",
                "room",
                ["writer", "critic"],
                ["Writes drafts", "Reviews drafts"],
            )
            .unwrap(),
        )
    }

    fn group_chat(
        selector: &ScriptedSelector,
        termination: Option<&ScriptedTermination>,
    ) -> (GroupChat<RecordingTransport>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let chat = GroupChat::new(
            SESSION,
            roster(),
            "manager",
            Box::new(selector.clone()),
            termination.map(|t| Box::new(t.clone()) as Box<dyn TerminationCondition>),
            transport.clone(),
        );
        (chat, transport)
    }

    fn content_on(topic_type: &str, source: &str, text: &str) -> Delivery {
        Delivery::on_topic(
            GroupChatEvent::publish(ChatMessage::text(source, text)),
            TopicId::new(topic_type, SESSION),
        )
    }

    fn from_parent(text: &str) -> Delivery {
        content_on("main", "user", text)
    }

    fn from_group(speaker: &str, text: &str) -> Delivery {
        content_on("room", speaker, text)
    }

    fn request_from(topic_type: &str) -> Delivery {
        Delivery::on_topic(GroupChatEvent::request(), TopicId::new(topic_type, SESSION))
    }

    fn messages(thread: &[ContentPublishEvent]) -> Vec<&str> {
        thread.iter().map(|e| e.message.content()).collect()
    }

    #[tokio::test]
    async fn test_writer_then_critic() {
        let selector = ScriptedSelector::new(["writer", "critic"]);
        let termination = ScriptedTermination::never();
        let (mut chat, transport) = group_chat(&selector, Some(&termination));

        chat.handle(request_from("main")).await.unwrap();
        assert_eq!(selector.calls(), vec![Vec::<ContentPublishEvent>::new()]);
        assert_eq!(transport.requests(), vec![TopicId::new("writer", SESSION)]);
        assert_eq!(
            chat.state(),
            &ChatState::AwaitingSpeakerReply {
                speaker: "writer".into()
            }
        );

        chat.handle(from_group("writer", "first draft")).await.unwrap();
        assert_eq!(messages(chat.thread()), ["first draft"]);
        assert_eq!(
            termination.checks(),
            vec![vec![ChatMessage::text("writer", "first draft")]]
        );
        assert_eq!(selector.calls()[1].len(), 1);
        assert_eq!(
            transport.requests(),
            vec![TopicId::new("writer", SESSION), TopicId::new("critic", SESSION)]
        );
    }

    #[tokio::test]
    async fn test_stop_on_second_group_message() {
        let selector = ScriptedSelector::new(["writer", "critic", "writer"]);
        let termination = ScriptedTermination::stop_on(2);
        let observer = Arc::new(RecordingObserver::default());
        let (chat, transport) = group_chat(&selector, Some(&termination));
        let mut chat = chat.with_observer(observer.clone());

        chat.handle(request_from("main")).await.unwrap();
        chat.handle(from_group("writer", "draft")).await.unwrap();
        chat.handle(from_group("critic", "approved")).await.unwrap();

        assert_eq!(messages(chat.thread()), ["draft", "approved"]);
        assert_eq!(termination.resets(), 1);
        assert_eq!(selector.call_count(), 2);
        assert_eq!(transport.requests().len(), 2);
        assert!(chat.state().is_terminated());

        let terminations: Vec<_> = observer
            .events()
            .into_iter()
            .filter(|e| matches!(e, ObservedEvent::Terminated { .. }))
            .collect();
        assert_eq!(terminations.len(), 1);
        match &terminations[0] {
            ObservedEvent::Terminated { session, event } => {
                assert_eq!(session, SESSION);
                assert_eq!(event.source, "manager");
                assert_eq!(event.message.content, "stopped on check 2");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_parent_content_relayed_once() {
        let selector = ScriptedSelector::new(["writer"]);
        let termination = ScriptedTermination::never();
        let (mut chat, transport) = group_chat(&selector, Some(&termination));

        chat.handle(from_parent("Write a haiku")).await.unwrap();

        let relays = transport.relays();
        assert_eq!(relays.len(), 1);
        assert_eq!(relays[0].0.message, ChatMessage::text("user", "Write a haiku"));
        assert_eq!(relays[0].0.publisher.as_deref(), Some("manager"));
        assert_eq!(relays[0].1, TopicId::new("room", SESSION));
        assert!(transport.requests().is_empty());
        assert_eq!(selector.call_count(), 0);
        assert!(termination.checks().is_empty());
        assert_eq!(messages(chat.thread()), ["Write a haiku"]);
        assert_eq!(chat.state(), &ChatState::Idle);
    }

    #[tokio::test]
    async fn test_request_from_group_rejected() {
        let selector = ScriptedSelector::new(["writer"]);
        let (mut chat, transport) = group_chat(&selector, None);

        let err = chat.handle(request_from("room")).await.unwrap_err();
        assert!(matches!(err, GroupChatError::ProtocolViolation { .. }));
        assert!(transport.published().is_empty());
        assert_eq!(selector.call_count(), 0);
    }

    #[tokio::test]
    async fn test_request_from_any_other_topic_starts() {
        let selector = ScriptedSelector::new(["critic"]);
        let (mut chat, transport) = group_chat(&selector, None);

        chat.handle(request_from("scheduler")).await.unwrap();
        assert_eq!(selector.calls(), vec![Vec::<ContentPublishEvent>::new()]);
        assert_eq!(transport.requests(), vec![TopicId::new("critic", SESSION)]);
    }

    #[tokio::test]
    async fn test_second_solicitation_rejected() {
        let selector = ScriptedSelector::new(["writer", "critic"]);
        let (mut chat, transport) = group_chat(&selector, None);

        chat.handle(request_from("main")).await.unwrap();
        let err = chat.handle(request_from("main")).await.unwrap_err();
        assert!(matches!(
            err,
            GroupChatError::Transition(TransitionError::SolicitationOutstanding(ref s)) if s == "writer"
        ));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(selector.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_speaker_rolls_back() {
        let selector = ScriptedSelector::new(["writer", "room"]);
        let termination = ScriptedTermination::never();
        let (mut chat, transport) = group_chat(&selector, Some(&termination));

        chat.handle(request_from("main")).await.unwrap();
        let err = chat.handle(from_group("writer", "draft")).await.unwrap_err();

        assert!(err.is_contract_violation());
        assert!(chat.thread().is_empty());
        assert_eq!(
            chat.state(),
            &ChatState::AwaitingSpeakerReply {
                speaker: "writer".into()
            }
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_rolls_back_relay() {
        let selector = ScriptedSelector::default();
        let (mut chat, transport) = group_chat(&selector, None);
        transport.fail_on("room");

        let err = chat.handle(from_parent("task")).await.unwrap_err();
        assert!(matches!(err, GroupChatError::Transport(_)));
        assert!(chat.thread().is_empty());
    }

    #[tokio::test]
    async fn test_missing_topic_and_wrong_session() {
        let selector = ScriptedSelector::new(["writer"]);
        let (mut chat, transport) = group_chat(&selector, None);

        let err = chat
            .handle(Delivery::new(GroupChatEvent::request(), MessageContext::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupChatError::MissingTopic));

        let err = chat
            .handle(Delivery::on_topic(
                GroupChatEvent::request(),
                TopicId::new("main", "other-session"),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupChatError::WrongSession { .. }));
        assert!(transport.published().is_empty());
    }

    #[tokio::test]
    async fn test_content_on_participant_topic_rejected() {
        let selector = ScriptedSelector::default();
        let (mut chat, _transport) = group_chat(&selector, None);

        let err = chat
            .handle(content_on("writer", "writer", "sideband"))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupChatError::UnexpectedOrigin { .. }));
        assert!(chat.thread().is_empty());
    }

    #[tokio::test]
    async fn test_terminated_then_restarted_by_parent() {
        let selector = ScriptedSelector::new(["writer", "critic"]);
        let termination = ScriptedTermination::stop_on(1);
        let (mut chat, transport) = group_chat(&selector, Some(&termination));

        chat.handle(request_from("main")).await.unwrap();
        chat.handle(from_group("writer", "done")).await.unwrap();
        assert!(chat.state().is_terminated());

        let err = chat.handle(from_group("critic", "late")).await.unwrap_err();
        assert!(matches!(
            err,
            GroupChatError::Transition(TransitionError::ConversationTerminated)
        ));
        assert_eq!(messages(chat.thread()), ["done"]);

        chat.handle(from_parent("next task")).await.unwrap();
        assert_eq!(chat.state(), &ChatState::Idle);
        chat.handle(request_from("main")).await.unwrap();
        assert_eq!(
            transport.requests(),
            vec![TopicId::new("writer", SESSION), TopicId::new("critic", SESSION)]
        );
        assert_eq!(termination.resets(), 1);
    }

    #[tokio::test]
    async fn test_unsolicited_reply_while_awaiting_rejected() {
        let roster = roster();
        let transport = Arc::new(RecordingTransport::new());
        let mut chat = GroupChat::new(
            SESSION,
            roster.clone(),
            "manager",
            Box::new(RoundRobinSelector::new(&roster)),
            None,
            transport.clone(),
        );

        chat.handle(request_from("main")).await.unwrap();
        let err = chat.handle(from_group("critic", "me first")).await.unwrap_err();
        assert!(matches!(
            err,
            GroupChatError::Transition(TransitionError::SolicitationOutstanding(ref s)) if s == "writer"
        ));
        assert!(chat.thread().is_empty());
        assert_eq!(chat.state().outstanding_speaker(), Some("writer"));
        assert_eq!(transport.requests(), vec![TopicId::new("writer", SESSION)]);

        // The awaited speaker can still answer
        chat.handle(from_group("writer", "draft")).await.unwrap();
        assert_eq!(messages(chat.thread()), ["draft"]);
        assert_eq!(
            transport.requests(),
            vec![TopicId::new("writer", SESSION), TopicId::new("critic", SESSION)]
        );
    }

    #[tokio::test]
    async fn test_observers_only_see_committed_content() {
        let observer = Arc::new(RecordingObserver::default());
        let (chat, transport) = group_chat(&ScriptedSelector::default(), None);
        let mut chat = chat.with_observer(observer.clone());
        transport.fail_on("room");

        chat.handle(from_parent("task")).await.unwrap_err();
        // Selector has no answers queued, so selection fails after the append
        chat.handle(from_group("writer", "draft")).await.unwrap_err();

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, ObservedEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_without_termination_always_selects() {
        let selector = ScriptedSelector::new(["writer", "critic", "writer", "critic"]);
        let (mut chat, transport) = group_chat(&selector, None);

        chat.handle(request_from("main")).await.unwrap();
        for (turn, speaker) in ["writer", "critic", "writer"].into_iter().enumerate() {
            chat.handle(from_group(speaker, &format!("turn {turn}")))
                .await
                .unwrap();
        }
        assert_eq!(chat.thread().len(), 3);
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_replay_is_deterministic() {
        async fn run_once() -> (Vec<ContentPublishEvent>, Vec<Published>) {
            let transport = Arc::new(RecordingTransport::new());
            let roster = roster();
            let mut chat = GroupChat::new(
                SESSION,
                roster.clone(),
                "manager",
                Box::new(RoundRobinSelector::new(&roster)),
                Some(Box::new(MaxMessageTermination::new(3))),
                transport.clone(),
            );
            let script = [
                from_parent("task"),
                request_from("main"),
                from_group("writer", "a"),
                from_group("critic", "b"),
                from_group("writer", "c"),
            ];
            for delivery in script {
                chat.handle(delivery).await.unwrap();
            }
            (chat.thread().to_vec(), transport.published())
        }

        let first = run_once().await;
        let second = run_once().await;
        assert_eq!(first, second);
        assert_eq!(first.0.len(), 4);
        // Relay + requests for writer, critic, writer
        assert_eq!(first.1.len(), 4);
    }

    // ------------------------------------------------------------------------
    // Session manager
    // ------------------------------------------------------------------------

    fn template() -> GroupChatTemplate {
        GroupChatTemplate::new(
            GroupChatConfig::default().with_topics("main", "room"),
            ["writer", "critic"],
            ["Writes drafts", "Reviews drafts"],
            |roster: &Roster| Box::new(RoundRobinSelector::new(roster)) as Box<dyn SpeakerSelector>,
        )
        .unwrap()
        .with_termination(|| Box::new(MaxMessageTermination::new(4)))
    }

    #[tokio::test]
    async fn test_manager_keeps_sessions_apart() {
        let transport = Arc::new(RecordingTransport::new());
        let manager = SessionManager::new(template(), transport.clone());

        for source in ["s1", "s2"] {
            manager
                .deliver(Delivery::on_topic(
                    GroupChatEvent::request(),
                    TopicId::new("main", source),
                ))
                .await
                .unwrap();
        }

        // Each session has its own round-robin selector
        assert_eq!(
            transport.requests(),
            vec![TopicId::new("writer", "s1"), TopicId::new("writer", "s2")]
        );
        assert_eq!(manager.sessions().await, ["s1", "s2"]);
        assert!(transport
            .published()
            .iter()
            .all(|p| p.sender == crate::config::DEFAULT_MANAGER_NAME));
    }

    #[tokio::test]
    async fn test_manager_reports_errors_to_caller() {
        let transport = Arc::new(RecordingTransport::new());
        let manager = SessionManager::new(template(), transport.clone());
        let mut events = manager.subscribe();

        let err = manager
            .deliver(Delivery::on_topic(
                GroupChatEvent::request(),
                TopicId::new("room", "s1"),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupChatError::ProtocolViolation { .. }));
        assert!(matches!(
            events.recv().await.unwrap(),
            ObservedEvent::Error { .. }
        ));

        let err = manager
            .deliver(Delivery::new(GroupChatEvent::request(), MessageContext::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, GroupChatError::MissingTopic));
        assert!(transport.published().is_empty());
    }

    #[tokio::test]
    async fn test_manager_close_session_starts_fresh() {
        let transport = Arc::new(RecordingTransport::new());
        let manager = SessionManager::new(template(), transport.clone());
        let start = || Delivery::on_topic(GroupChatEvent::request(), TopicId::new("main", "s1"));

        manager.deliver(start()).await.unwrap();
        assert!(manager.close_session("s1").await);
        assert!(!manager.close_session("s1").await);

        // A new actor with a new selector, so writer again
        manager.deliver(start()).await.unwrap();
        assert_eq!(
            transport.requests(),
            vec![TopicId::new("writer", "s1"), TopicId::new("writer", "s1")]
        );
    }

    #[tokio::test]
    async fn test_zero_mailbox_capacity_rejected() {
        let config: GroupChatConfig = serde_json::from_str(
            r#"{"parent_topic_type":"main","group_topic_type":"room","mailbox_capacity":0}"#,
        )
        .unwrap();
        let result = GroupChatTemplate::new(
            config,
            ["writer", "critic"],
            ["Writes drafts", "Reviews drafts"],
            |roster: &Roster| Box::new(RoundRobinSelector::new(roster)) as Box<dyn SpeakerSelector>,
        );
        assert!(matches!(
            result,
            Err(crate::error::ConfigError::InvalidSetting { name: "mailbox_capacity", .. })
        ));
    }

    #[tokio::test]
    async fn test_terminated_session_kept_until_closed() {
        let transport = Arc::new(RecordingTransport::new());
        let template = GroupChatTemplate::new(
            GroupChatConfig::default().with_topics("main", "room"),
            ["writer", "critic"],
            ["Writes drafts", "Reviews drafts"],
            |roster: &Roster| Box::new(RoundRobinSelector::new(roster)) as Box<dyn SpeakerSelector>,
        )
        .unwrap()
        .with_termination(|| Box::new(MaxMessageTermination::new(1)));
        let manager = SessionManager::new(template, transport.clone());
        let mut events = manager.subscribe();

        manager
            .deliver(Delivery::on_topic(GroupChatEvent::request(), TopicId::new("main", "s1")))
            .await
            .unwrap();
        manager
            .deliver(content_on_session("room", "s1", "writer", "done"))
            .await
            .unwrap();

        let mut terminated = false;
        while let Ok(event) = events.try_recv() {
            terminated |= matches!(event, ObservedEvent::Terminated { .. });
        }
        assert!(terminated);
        assert_eq!(manager.sessions().await, ["s1"]);

        // Parent content starts a new run on the same session
        manager
            .deliver(content_on_session("main", "s1", "user", "again"))
            .await
            .unwrap();
        assert!(manager.close_session("s1").await);
        assert!(manager.sessions().await.is_empty());
    }

    fn content_on_session(topic_type: &str, session: &str, source: &str, text: &str) -> Delivery {
        Delivery::on_topic(
            GroupChatEvent::publish(ChatMessage::text(source, text)),
            TopicId::new(topic_type, session),
        )
    }

    /// Participant that answers every content request with a numbered line
    async fn answer_requests(
        bus: Arc<InMemoryBus>,
        name: &'static str,
        mut mailbox: tokio::sync::mpsc::Receiver<Delivery>,
    ) {
        let mut turn = 0;
        while let Some(delivery) = mailbox.recv().await {
            let (GroupChatEvent::ContentRequest(_), Some(topic)) =
                (delivery.event, delivery.context.topic_id)
            else {
                continue;
            };
            turn += 1;
            let reply = GroupChatEvent::publish(ChatMessage::text(name, format!("{name} #{turn}")));
            bus.publish(name, reply, topic.sibling("room")).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_round_robin_over_bus_until_max_messages() {
        let bus = Arc::new(InMemoryBus::new());
        let manager_name = crate::config::DEFAULT_MANAGER_NAME;
        let manager_rx = bus.register(manager_name, 32).await;
        bus.subscribe(manager_name, "main").await.unwrap();
        bus.subscribe(manager_name, "room").await.unwrap();

        for name in ["writer", "critic"] {
            let rx = bus.register(name, 32).await;
            bus.subscribe(name, name).await.unwrap();
            bus.subscribe(name, "room").await.unwrap();
            tokio::spawn(answer_requests(bus.clone(), name, rx));
        }

        let manager = Arc::new(SessionManager::new(template(), bus.clone()));
        let mut events = manager.subscribe();
        tokio::spawn(manager.clone().pump(manager_rx));

        let main = TopicId::new("main", "run-1");
        bus.publish("user", GroupChatEvent::publish(ChatMessage::text("user", "go")), main.clone())
            .await
            .unwrap();
        bus.publish("user", GroupChatEvent::request(), main).await.unwrap();

        let mut speakers = Vec::new();
        let mut group_messages = 0;
        let stop = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match events.recv().await.unwrap() {
                    ObservedEvent::SpeakerRequested { speaker, .. } => speakers.push(speaker),
                    ObservedEvent::ContentReceived { origin, .. } if origin == "room" => {
                        group_messages += 1;
                    }
                    ObservedEvent::Terminated { event, .. } => return event,
                    _ => {}
                }
            }
        })
        .await
        .expect("conversation should terminate");

        assert_eq!(speakers, ["writer", "critic", "writer", "critic"]);
        assert_eq!(group_messages, 4);
        assert_eq!(stop.message.source, "MaxMessageTermination");
    }
}
