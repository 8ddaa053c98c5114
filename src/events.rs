use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::FailureKind;

/// Compile-session events for renderers and JSON output.
/// Emitted under the session lock, so their order matches the order of state transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Session entered `Loading`
    CompileStarted {
        session_id: String,
        request_id: u64,
        started_at: DateTime<Utc>,
    },

    /// Request finished and its result was committed
    CompileSucceeded {
        session_id: String,
        request_id: u64,
        states: u64,
        transitions: u64,
        warnings: usize,
        duration_ms: Option<u64>,
    },

    /// Request failed and the failure was committed
    CompileFailed {
        session_id: String,
        request_id: u64,
        message: String,
        kind: FailureKind,
        duration_ms: Option<u64>,
    },

    /// Payload rejected locally; no request was sent
    InputRejected { session_id: String, reason: String },

    /// Session returned to `Idle`; any in-flight response will be discarded
    SessionReset { session_id: String },
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::CompileStarted { session_id, .. }
            | SessionEvent::CompileSucceeded { session_id, .. }
            | SessionEvent::CompileFailed { session_id, .. }
            | SessionEvent::InputRejected { session_id, .. }
            | SessionEvent::SessionReset { session_id } => session_id,
        }
    }
}
