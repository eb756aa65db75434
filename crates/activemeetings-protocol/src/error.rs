//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while decoding wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Line exceeds maximum allowed size.
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Payload is not valid JSON for the expected type.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Line is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// IO error while reading the stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Join response carried neither a join URL nor a wait instruction.
    #[error("join response has no join URL")]
    MissingJoinUrl,
}
