//! Client for compiling procedural manuals into finite-state machines.
//!
//! [`input::InputController`] holds the typed text or selected file,
//! [`session::CompileSession`] sends it to the compiler service and tracks the
//! request life cycle, and [`view::render`] maps both onto what the user sees.

#[cfg(feature = "cli")]
pub mod cli;
pub mod error;
pub mod events;
pub mod input;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod view;

pub use error::{FsmcError, Result};
