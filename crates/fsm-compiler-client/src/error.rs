//! Error types for the FSM compiler client.

use thiserror::Error;

/// Errors that can occur when talking to the FSM compiler service.
#[derive(Debug, Error)]
pub enum CompilerClientError {
    /// HTTP request failed before a response arrived (connection refused, timeout, ...)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Service answered with a non-2xx status
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Service answered 2xx but the body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid configuration (bad base URL, bad upload metadata)
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl CompilerClientError {
    /// HTTP status attached to the failure, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CompilerClientError::ApiError { status, .. } => Some(*status),
            CompilerClientError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the failure is a well-formed 2xx with a body we could not understand.
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, CompilerClientError::ParseError(_))
    }
}

impl From<serde_json::Error> for CompilerClientError {
    fn from(err: serde_json::Error) -> Self {
        CompilerClientError::ParseError(err.to_string())
    }
}

impl From<url::ParseError> for CompilerClientError {
    fn from(err: url::ParseError) -> Self {
        CompilerClientError::ConfigError(err.to_string())
    }
}
