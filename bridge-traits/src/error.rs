use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Broad origin of a remote failure as reported by the provider transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The request never produced an HTTP response (DNS, connection reset, offline).
    Transport,
    /// The provider answered with a non-success HTTP status.
    Http,
    /// Anything else the engine could not attribute.
    Other,
}

/// Error surfaced by a sync engine or a cloud provider.
///
/// The core never inspects provider payloads; it only looks at `kind`,
/// `code` and `message` when deciding whether a failure is transient or
/// requires the user to sign in again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub code: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Transport-level failure (no response received).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transport, None, message)
    }

    /// Provider responded with an HTTP error status.
    pub fn http(code: u16, message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Http, Some(code), message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Other, None, message)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {}
