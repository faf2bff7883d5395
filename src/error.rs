//! Error types for provider operations

use thiserror::Error;

/// Main error type for everything that talks to the Platform
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// Network or client-side failure before a status code was received
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("expected status code {expected}, received: status={status} body={body}")]
    Status {
        expected: u16,
        status: u16,
        body: String,
    },

    /// 2xx response whose body could not be decoded
    #[error("{0}")]
    Decode(String),

    /// 2xx response where a required field was missing or null
    #[error("response was empty")]
    EmptyPayload,

    /// Client-side precondition failed, one message per violation
    #[error("{}", .errors.join("\n"))]
    Validation { errors: Vec<String> },

    /// JSON merge produced something that is not a JSON document
    #[error("merge error: {0}")]
    Merge(String),

    /// Observed state outside the enumerated domain
    #[error("unexpected cluster state: {0}")]
    StateMachine(String),

    /// Resource does not exist on the Platform
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// The Platform reports the resource as failed
    #[error("{resource} {id} failed: {message}")]
    ResourceFailed {
        resource: &'static str,
        id: String,
        message: String,
    },

    /// The Platform is still working on a requested change
    #[error("{0}")]
    Pending(String),

    /// Deadline elapsed while the last outcome was still retryable
    #[error("{operation}: deadline exceeded: {last}")]
    DeadlineExceeded {
        operation: String,
        last: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Create a validation error with a single message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![msg.into()],
        }
    }

    /// Create a decode error with the given message
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a pending marker with the given wait reason
    pub fn pending(reason: impl Into<String>) -> Self {
        Self::Pending(reason.into())
    }

    /// Whether the retry executor may recover from this error
    ///
    /// Transport failures, 5xx and 429 responses, and pending waits are
    /// retryable. Everything else surfaces to the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Pending(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status carried by a `Status` error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
