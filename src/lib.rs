//! Chorus - turn-taking orchestration for group chats over pub/sub
//!
//! A group chat manager sits between a parent topic, where work arrives,
//! and a group topic shared by a fixed roster of participants. It keeps the
//! conversation thread, asks a termination condition whether to stop, and
//! asks a speaker selector who goes next. One manager actor runs per
//! session `source`.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod message;
pub mod observer;
pub mod roster;
pub mod router;
pub mod runtime;
pub mod selector;
pub mod state_machine;
pub mod termination;
pub mod topic;
pub mod transport;

pub use config::GroupChatConfig;
pub use error::{ConfigError, GroupChatError};
pub use message::{
    ChatMessage, ContentPublishEvent, ContentRequestEvent, GroupChatEvent, StopMessage,
    TerminationEvent,
};
pub use observer::{BroadcastObserver, EventObserver, ObservedEvent, TracingObserver};
pub use roster::{Participant, Roster};
pub use runtime::{GroupChat, GroupChatTemplate, SessionManager};
pub use selector::{FnSelector, RoundRobinSelector, SelectionError, SpeakerSelector};
pub use termination::{
    AndTermination, MaxMessageTermination, OrTermination, StopMessageTermination,
    TerminationCondition, TerminationError, TextMentionTermination,
};
pub use topic::{Delivery, MessageContext, TopicId};
pub use transport::{InMemoryBus, Transport, TransportError};
