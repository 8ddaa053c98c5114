//! Request and response types for the FSM compiler API.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Multipart field carrying an uploaded manual file
pub const FILE_FIELD: &str = "file";

/// Multipart field carrying typed manual text
pub const TEXT_FIELD: &str = "text";

/// Content type announced for uploaded manuals
pub const MANUAL_MIME: &str = "text/plain";

/// Body of a single compile request.
///
/// The service accepts exactly one of the two multipart fields, so the request
/// is a sum type rather than a pair of optionals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileRequest {
    /// Manual typed by the user, sent under the `text` field
    Text(String),
    /// Raw bytes of an uploaded manual, sent under the `file` field
    File { name: String, content: Bytes },
}

impl CompileRequest {
    /// Create a text request.
    pub fn text(content: impl Into<String>) -> Self {
        CompileRequest::Text(content.into())
    }

    /// Create a file upload request.
    pub fn file(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        CompileRequest::File {
            name: name.into(),
            content: content.into(),
        }
    }

    /// The multipart field this request will be sent under.
    pub fn field_name(&self) -> &'static str {
        match self {
            CompileRequest::Text(_) => TEXT_FIELD,
            CompileRequest::File { .. } => FILE_FIELD,
        }
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        match self {
            CompileRequest::Text(text) => text.len(),
            CompileRequest::File { content, .. } => content.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State and transition counts of the compiled FSM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsmStats {
    pub states: u64,
    pub transitions: u64,
}

/// Successful response body of `POST /compile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileResponse {
    /// Graphviz DOT description of the FSM
    pub dot_source: String,

    pub fsm_stats: FsmStats,

    /// Pipeline status reported by the service ("success")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Consistency problems found by the service's FSM checker
    #[serde(default)]
    pub validation_errors: Vec<String>,

    /// Structured FSM dump; opaque to this client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsm_data: Option<serde_json::Value>,
}

/// Response body of the `GET /` liveness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Error body produced by the service on 4xx/5xx (`{"detail": "..."}`)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}
