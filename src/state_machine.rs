//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

pub mod action;
mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use action::Action;
pub use effect::{Effect, ScreenTarget};
pub use event::Event;
pub use state::{project, ConvContext, ConvState, Scratch};
pub use transition::transition;
