// Runtime abstraction between the compile session and whatever presents it.
//
// The session only knows how to emit events; the CLI runtime forwards them
// through a channel to the output loop.

use std::any::Any;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::events::SessionEvent;
use crate::view::ViewModel;

/// Runtime-specific errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Event receiver closed")]
    ReceiverClosed,
}

/// Events delivered to the presentation layer
///
/// Serialized as `{"event": "session" | "view", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// Compile-session lifecycle event
    Session(SessionEvent),

    /// Complete view to present; ends one compile round
    View(Box<ViewModel>),
}

/// Runtime abstraction for the presentation environment
///
/// # Object Safety
/// This trait is object-safe and intended to be used as `Arc<dyn FsmcRuntime>`.
#[async_trait]
pub trait FsmcRuntime: Send + Sync + 'static {
    /// Emit an event to the frontend/output
    ///
    /// # Errors
    /// Returns `RuntimeError::ReceiverClosed` if the event cannot be delivered.
    fn emit(&self, event: RuntimeEvent) -> Result<(), RuntimeError>;

    /// Check if running in interactive mode (has a TTY)
    fn is_interactive(&self) -> bool;

    /// Graceful shutdown - flush events, close channels, etc.
    async fn shutdown(&self) -> Result<(), RuntimeError>;

    /// Get as Any for downcasting to concrete type.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::CliRuntime;
