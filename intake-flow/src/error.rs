use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::intake::Rejection;

/// Errors raised along the intake → transfer → render path
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("File rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("A transfer is already in progress")]
    Busy,

    #[error("No transfer is in flight")]
    NotInFlight,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Extraction service returned HTTP {status}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    MalformedBody(String),
}

impl From<reqwest::Error> for IntakeError {
    fn from(err: reqwest::Error) -> Self {
        IntakeError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;

/// Why a transfer ended in `Failed`; the cloneable form of the transport/protocol errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The service answered with a non-success status
    HttpStatus(u16),
    /// Connect, DNS or abrupt termination
    Transport(String),
    /// The body was not a JSON object
    Parse(String),
}

impl FailureReason {
    /// Protocol failures got a response back; transport failures did not
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::HttpStatus(_) | Self::Parse(_))
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpStatus(status) => write!(f, "HTTP error, status {}", status),
            Self::Transport(msg) => write!(f, "network error: {}", msg),
            Self::Parse(msg) => write!(f, "unreadable response: {}", msg),
        }
    }
}

impl From<&IntakeError> for FailureReason {
    fn from(err: &IntakeError) -> Self {
        match err {
            IntakeError::HttpStatus { status, .. } => Self::HttpStatus(*status),
            IntakeError::MalformedBody(msg) => Self::Parse(msg.clone()),
            IntakeError::Transport(msg) => Self::Transport(msg.clone()),
            // Pipeline-level errors never reach the wire; report them as transport failures
            other => Self::Transport(other.to_string()),
        }
    }
}
