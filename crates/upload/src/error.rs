//! Upload error types and failure classification.

use std::fmt;
use std::path::PathBuf;

use tubelift_transfer::{RetryPolicy, TransferError};

/// Connection-level failure kinds reported by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// Could not establish a connection.
    Connect,
    /// Connection reset or aborted by the peer.
    ConnectionReset,
    /// Response ended before the full body arrived.
    IncompleteRead,
    /// Response status line or headers could not be parsed.
    BadStatusLine,
    /// Request did not complete within the transport timeout.
    Timeout,
    /// Any other I/O failure below HTTP.
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::ConnectionReset => "connection reset",
            Self::IncompleteRead => "incomplete read",
            Self::BadStatusLine => "bad status line",
            Self::Timeout => "timeout",
            Self::Other => "i/o",
        })
    }
}

/// Failure reported by an [`UploadTransport`](crate::UploadTransport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    pub fn network(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self::Network {
            kind,
            message: message.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Decides whether the driver may retry after this failure.
    pub fn classify(&self, policy: &RetryPolicy) -> FailureClass {
        match self {
            Self::Network { .. } => FailureClass::Retriable,
            Self::Status { status, .. } if policy.is_retriable_status(*status) => {
                FailureClass::Retriable
            }
            Self::Status { .. } => FailureClass::Fatal,
            Self::MalformedResponse(_) => FailureClass::Fatal,
        }
    }
}

/// Outcome of classifying a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retriable,
    Fatal,
}

/// Errors that end an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("retries exhausted after {attempts} attempts (last error: {last_error})")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(TransportError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("no files to upload: {0}")]
    NoJobs(String),
}

impl From<TransportError> for UploadError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status, body } => Self::Http { status, body },
            TransportError::MalformedResponse(msg) => Self::UnexpectedResponse(msg),
            network @ TransportError::Network { .. } => Self::Transport(network),
        }
    }
}
