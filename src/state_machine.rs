//! Group chat state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! Calls out to collaborators (termination, speaker selection, transport)
//! are expressed as effects; their results come back as events.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{ChatContext, ChatState};
pub use transition::{transition, TransitionError, TransitionResult};
