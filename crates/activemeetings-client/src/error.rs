//! Client error types.

use std::fmt;

use activemeetings_protocol::ProtocolError;
use activemeetings_providers::ProviderError;
use activemeetings_sync::SyncError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Snapshot or join request failed.
    Provider(String),
    /// IO error.
    Io(std::io::Error),
    /// Event stream could not be read.
    Protocol(String),
    /// Session loop failed or stopped early.
    Session(String),
    /// Membership store could not be read or written.
    Store(String),
    /// Action failed (join, open, etc).
    Action(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Session(msg) => write!(f, "session error: {}", msg),
            Self::Store(msg) => write!(f, "store error: {}", msg),
            Self::Action(msg) => write!(f, "action failed: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(err) => Self::Io(err),
            other => Self::Protocol(other.to_string()),
        }
    }
}

impl From<SyncError> for ClientError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Provider(err) => err.into(),
            other => Self::Session(other.to_string()),
        }
    }
}
