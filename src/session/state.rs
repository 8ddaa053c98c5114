//! Session state types.

use fsm_compiler_client::{CompileResponse, FsmStats};
use serde::{Deserialize, Serialize};

use crate::error::FsmcError;

/// The single user-facing message for every remote failure
pub const COMPILE_FAILED_MESSAGE: &str = "Failed to compile. Ensure backend is running.";

/// Identifier of one submitted compile request, increasing per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub(crate) u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A compiled FSM as returned by the service. Replaced wholesale on the next success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResult {
    /// Graphviz DOT description, handed to the graph renderer untouched
    pub dot_source: String,
    pub stats: FsmStats,
    /// FSM consistency warnings reported alongside the graph
    pub validation_errors: Vec<String>,
}

impl From<CompileResponse> for CompileResult {
    fn from(response: CompileResponse) -> Self {
        Self {
            dot_source: response.dot_source,
            stats: response.fsm_stats,
            validation_errors: response.validation_errors,
        }
    }
}

/// Structured cause of a failure, kept for logs and JSON output only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Status(u16),
    MalformedResponse,
}

/// A committed compile failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// User-facing message; never carries the remote detail
    pub message: String,
    pub kind: FailureKind,
}

impl Failure {
    pub fn new(kind: FailureKind) -> Self {
        Self {
            message: COMPILE_FAILED_MESSAGE.to_string(),
            kind,
        }
    }

    /// Classify an error raised at the request boundary.
    pub fn from_error(err: &FsmcError) -> Self {
        let kind = match err {
            FsmcError::Status { status, .. } => FailureKind::Status(*status),
            FsmcError::MalformedResponse(_) => FailureKind::MalformedResponse,
            _ => FailureKind::Transport,
        };
        Self::new(kind)
    }
}

/// Current state of the compile life cycle. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    Succeeded(CompileResult),
    Failed(Failure),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn result(&self) -> Option<&CompileResult> {
        match self {
            SessionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            SessionState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Succeeded(_) => "succeeded",
            SessionState::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_hides_remote_detail() {
        let err = FsmcError::Status {
            status: 500,
            message: "Traceback: segmenter exploded".to_string(),
        };
        let failure = Failure::from_error(&err);
        assert_eq!(failure.message, COMPILE_FAILED_MESSAGE);
        assert_eq!(failure.kind, FailureKind::Status(500));
    }

    #[test]
    fn test_failure_kinds() {
        let transport = Failure::from_error(&FsmcError::Transport("connection refused".into()));
        assert_eq!(transport.kind, FailureKind::Transport);

        let malformed = Failure::from_error(&FsmcError::MalformedResponse("missing field".into()));
        assert_eq!(malformed.kind, FailureKind::MalformedResponse);
    }

    #[test]
    fn test_result_from_response() {
        let response: CompileResponse = serde_json::from_str(
            r#"{"dot_source": "digraph{}", "fsm_stats": {"states": 2, "transitions": 1},
                "validation_errors": ["dead end"]}"#,
        )
        .unwrap();
        let result = CompileResult::from(response);
        assert_eq!(result.stats.states, 2);
        assert_eq!(result.validation_errors, vec!["dead end".to_string()]);
    }

    #[test]
    fn test_state_json_tag() {
        let json = serde_json::to_value(SessionState::Failed(Failure::new(FailureKind::Transport)))
            .unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], COMPILE_FAILED_MESSAGE);
    }
}
