//! Chorus demo
//!
//! Wires a writer and a critic to a group chat manager over the in-memory
//! bus and lets them take turns until a message limit is reached.

use chorus::config::positive_from_env;
use chorus::{
    ChatMessage, Delivery, GroupChatConfig, GroupChatEvent, GroupChatTemplate, InMemoryBus,
    MaxMessageTermination, ObservedEvent, RoundRobinSelector, Roster, SessionManager,
    SpeakerSelector, TopicId, Transport,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PARENT_AGENT: &str = "user";
const DEFAULT_MAX_MESSAGES: usize = 4;
const PARTICIPANTS: [(&str, &str); 2] = [
    ("writer", "Writes drafts of the requested text"),
    ("critic", "Reviews drafts and asks for changes"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus=info,chorus_demo=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = GroupChatConfig::from_env()?;
    let max_messages = positive_from_env("CHORUS_MAX_MESSAGES", DEFAULT_MAX_MESSAGES)?;

    tracing::info!(
        parent = %config.parent_topic_type,
        group = %config.group_topic_type,
        manager = %config.manager_name,
        max_messages,
        "Starting group chat demo"
    );

    let bus = Arc::new(InMemoryBus::new());

    // Manager listens on the parent and group topics
    let manager_rx = bus
        .register(&config.manager_name, config.mailbox_capacity)
        .await;
    bus.subscribe(&config.manager_name, &config.parent_topic_type)
        .await?;
    bus.subscribe(&config.manager_name, &config.group_topic_type)
        .await?;

    // Each participant listens on its own topic
    for (name, _) in PARTICIPANTS {
        let mailbox = bus.register(name, config.mailbox_capacity).await;
        bus.subscribe(name, name).await?;
        tokio::spawn(run_participant(
            bus.clone(),
            name,
            config.group_topic_type.clone(),
            mailbox,
        ));
    }

    let template = GroupChatTemplate::new(
        config.clone(),
        PARTICIPANTS.map(|(name, _)| name),
        PARTICIPANTS.map(|(_, description)| description),
        |roster: &Roster| Box::new(RoundRobinSelector::new(roster)) as Box<dyn SpeakerSelector>,
    )?
    .with_termination(move || Box::new(MaxMessageTermination::new(max_messages)));

    let manager = Arc::new(SessionManager::new(template, bus.clone()));
    let events = manager.subscribe();
    tokio::spawn(manager.clone().pump(manager_rx));

    // Kick off one session from the parent topic
    let session = uuid::Uuid::new_v4().to_string();
    let parent = TopicId::new(config.parent_topic_type.clone(), session.clone());
    bus.publish(
        PARENT_AGENT,
        GroupChatEvent::publish(ChatMessage::text(
            PARENT_AGENT,
            "Write a short poem about the sea",
        )),
        parent.clone(),
    )
    .await?;
    bus.publish(PARENT_AGENT, GroupChatEvent::request(), parent)
        .await?;

    match tokio::time::timeout(Duration::from_secs(30), wait_for_stop(events, &session)).await {
        Ok(Some(event)) => {
            tracing::info!(
                session = %session,
                source = %event.message.source,
                reason = %event.message.content,
                "Conversation finished"
            );
        }
        Ok(None) => tracing::warn!(session = %session, "Event stream closed before termination"),
        Err(_) => tracing::warn!(session = %session, "Timed out waiting for termination"),
    }

    manager.close_session(&session).await;
    Ok(())
}

/// Log conversation progress until `session` terminates
async fn wait_for_stop(
    mut events: broadcast::Receiver<ObservedEvent>,
    session: &str,
) -> Option<chorus::TerminationEvent> {
    loop {
        match events.recv().await {
            Ok(ObservedEvent::Terminated { session: s, event }) if s == session => {
                return Some(event)
            }
            Ok(ObservedEvent::ContentReceived { event, .. }) => {
                tracing::info!(
                    from = %event.message.source(),
                    text = %event.message.content(),
                    "Message"
                );
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Observer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Answer every content request with the next numbered draft or review
async fn run_participant(
    bus: Arc<InMemoryBus>,
    name: &'static str,
    group_topic_type: String,
    mut mailbox: mpsc::Receiver<Delivery>,
) {
    let mut turn = 0;
    while let Some(delivery) = mailbox.recv().await {
        let (GroupChatEvent::ContentRequest(_), Some(topic)) =
            (delivery.event, delivery.context.topic_id)
        else {
            continue;
        };

        turn += 1;
        let text = match name {
            "writer" => format!("Draft {turn}: waves fold into foam, and the tide keeps time"),
            _ => format!("Review {turn}: tighten the second line"),
        };
        let reply = GroupChatEvent::publish(ChatMessage::text(name, text));
        if let Err(e) = bus
            .publish(name, reply, topic.sibling(group_topic_type.clone()))
            .await
        {
            tracing::error!(participant = name, error = %e, "Failed to publish reply");
        }
    }
}
