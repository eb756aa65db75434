//! Wire types for activemeetings.
//!
//! Three payloads cross the boundary of the core:
//!
//! - [`EventMessage`]: one presence change pushed by the meetings channel,
//!   delivered as newline-delimited JSON (see [`LineReader`])
//! - [`SnapshotResponse`]: the list of running meetings returned by the
//!   snapshot endpoint
//! - [`JoinResponse`]: the answer of the join endpoint, interpreted as a
//!   [`JoinDecision`]
//!
//! # Example
//!
//! ```rust
//! use activemeetings_protocol::{decode_line, EventMessage, EventMethod};
//!
//! let line = r#"{"method":"join","meeting":"Room A","room":"u1","role":"MODERATOR"}"#;
//! let message: EventMessage = decode_line(line).unwrap().unwrap();
//! assert_eq!(message.method, EventMethod::Join);
//! ```

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_line, LineReader};
pub use types::{
    EventMessage, EventMethod, JoinDecision, JoinRequest, JoinResponse, JoinResponseBody,
    MeetingDescriptor, MeetingMetadata, SnapshotResponse, WAIT_FOR_MODERATOR,
};

/// Maximum size of one event line (64 KiB).
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;
