//! Error type shared by input validation, the compile session and the CLI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsmcError {
    /// Payload rejected locally; never reaches the network
    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Compile request already in flight")]
    CompileInFlight,

    /// Network unreachable or timed out
    #[error("Transport error: {0}")]
    Transport(String),

    /// Service answered with a non-2xx status
    #[error("Service error ({status}): {message}")]
    Status { status: u16, message: String },

    /// 2xx response whose body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<fsm_compiler_client::CompilerClientError> for FsmcError {
    fn from(err: fsm_compiler_client::CompilerClientError) -> Self {
        use fsm_compiler_client::CompilerClientError;

        match err {
            CompilerClientError::ApiError { status, message } => {
                FsmcError::Status { status, message }
            }
            CompilerClientError::ParseError(message) => FsmcError::MalformedResponse(message),
            other => FsmcError::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FsmcError>;
