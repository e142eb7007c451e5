//! Core session state machine
//!
//! One owned state value, pure transitions, explicit effects. The runtime
//! executes the effects; nothing here performs I/O.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{Motion, SessionContext, SessionState};
pub use transition::transition;
