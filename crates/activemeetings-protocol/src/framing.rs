//! Newline-delimited JSON framing for the presence channel.
//!
//! Each message is one JSON object on its own line:
//!
//! ```text
//! {"method":"create","meeting":"Room A","room":"u1"}\n
//! {"method":"join","meeting":"Room A","room":"u1","role":"MODERATOR"}\n
//! ```
//!
//! Blank lines are skipped. A malformed line yields an error but does not
//! poison the reader: the next call continues with the following line.

use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::MAX_MESSAGE_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

/// Decodes one line. Returns `Ok(None)` for a blank line.
///
/// # Example
///
/// ```rust
/// use activemeetings_protocol::{decode_line, EventMessage};
///
/// let blank: Option<EventMessage> = decode_line("   \n").unwrap();
/// assert!(blank.is_none());
/// ```
pub fn decode_line<T: DeserializeOwned>(line: &str) -> ProtocolResult<Option<T>> {
    if line.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: line.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(line)?))
}

/// Reads newline-delimited messages from an async byte stream.
///
/// At most `MAX_MESSAGE_SIZE + 1` bytes of a line are kept in memory; the
/// rest of an oversized line is read and discarded.
pub struct LineReader<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Creates a new LineReader wrapping the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }

    /// Reads the next message, skipping blank lines.
    ///
    /// Returns `Ok(None)` at end of stream. Oversized and non-UTF-8 lines
    /// are reported as errors and consumed, so the next call continues with
    /// the following line.
    pub async fn read_message<T: DeserializeOwned>(&mut self) -> ProtocolResult<Option<T>> {
        loop {
            let size = self.read_line().await?;
            if size == 0 {
                return Ok(None);
            }
            if size > MAX_MESSAGE_SIZE {
                return Err(ProtocolError::MessageTooLarge {
                    size,
                    max: MAX_MESSAGE_SIZE,
                });
            }

            let line = std::str::from_utf8(&self.line)?;
            if let Some(message) = decode_line(line)? {
                return Ok(Some(message));
            }
        }
    }

    /// Reads up to and including the next newline into `self.line`, keeping
    /// at most `MAX_MESSAGE_SIZE + 1` bytes. Returns the full line length.
    async fn read_line(&mut self) -> std::io::Result<usize> {
        self.line.clear();
        let mut size = 0;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(size);
            }

            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(end) => (end + 1, true),
                None => (available.len(), false),
            };
            let room = (MAX_MESSAGE_SIZE + 1).saturating_sub(self.line.len());
            self.line.extend_from_slice(&available[..used.min(room)]);
            self.reader.consume(used);
            size += used;

            if done {
                return Ok(size);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventMessage, EventMethod};

    #[test]
    fn decode_blank_line() {
        let decoded: Option<EventMessage> = decode_line("\n").unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn decode_too_large() {
        let line = "x".repeat(MAX_MESSAGE_SIZE + 1);
        let result: ProtocolResult<Option<EventMessage>> = decode_line(&line);
        assert!(matches!(result, Err(ProtocolError::MessageTooLarge { .. })));
    }

    #[tokio::test]
    async fn reader_multiple_messages() {
        let input = concat!(
            r#"{"method":"create","meeting":"Room A","room":"u1"}"#,
            "\n\n",
            r#"{"method":"join","meeting":"Room A","room":"u1","role":"MODERATOR"}"#,
            "\n",
        );
        let mut reader = LineReader::new(input.as_bytes());

        let first: EventMessage = reader.read_message().await.unwrap().unwrap();
        assert_eq!(first.method, EventMethod::Create);

        let second: EventMessage = reader.read_message().await.unwrap().unwrap();
        assert_eq!(second.method, EventMethod::Join);
        assert_eq!(second.role.as_deref(), Some("MODERATOR"));

        let eof: Option<EventMessage> = reader.read_message().await.unwrap();
        assert!(eof.is_none());
    }

    #[tokio::test]
    async fn reader_recovers_after_malformed_line() {
        let input = concat!(
            "not json\n",
            r#"{"method":"destroy","meeting":"Room A","room":"u1"}"#,
        );
        let mut reader = LineReader::new(input.as_bytes());

        let bad: ProtocolResult<Option<EventMessage>> = reader.read_message().await;
        assert!(matches!(bad, Err(ProtocolError::Serialization(_))));

        // Final line without trailing newline still decodes
        let good: EventMessage = reader.read_message().await.unwrap().unwrap();
        assert_eq!(good.method, EventMethod::Destroy);
    }

    #[tokio::test]
    async fn reader_skips_invalid_utf8_line() {
        let mut input = br#"{"method":"create","meeting":""#.to_vec();
        input.push(0xff);
        input.extend_from_slice(br#"","room":"u1"}"#);
        input.push(b'\n');
        input.extend_from_slice(br#"{"method":"destroy","meeting":"Room A","room":"u1"}"#);
        input.push(b'\n');
        let mut reader = LineReader::new(&input[..]);

        let bad: ProtocolResult<Option<EventMessage>> = reader.read_message().await;
        assert!(matches!(bad, Err(ProtocolError::InvalidUtf8(_))));

        let good: EventMessage = reader.read_message().await.unwrap().unwrap();
        assert_eq!(good.method, EventMethod::Destroy);
        assert_eq!(good.meeting, "Room A");
    }

    #[tokio::test]
    async fn reader_bounds_oversized_line() {
        let mut input = "x".repeat(MAX_MESSAGE_SIZE * 4);
        input.push('\n');
        input.push_str(r#"{"method":"create","meeting":"Room A","room":"u1"}"#);
        input.push('\n');
        let mut reader = LineReader::new(input.as_bytes());

        let big: ProtocolResult<Option<EventMessage>> = reader.read_message().await;
        match big {
            Err(ProtocolError::MessageTooLarge { size, max }) => {
                assert_eq!(size, MAX_MESSAGE_SIZE * 4 + 1);
                assert_eq!(max, MAX_MESSAGE_SIZE);
            }
            other => panic!("expected MessageTooLarge, got {:?}", other.map(|_| ())),
        }
        assert!(reader.line.len() <= MAX_MESSAGE_SIZE + 1);

        let next: EventMessage = reader.read_message().await.unwrap().unwrap();
        assert_eq!(next.method, EventMethod::Create);
    }

    #[tokio::test]
    async fn reader_oversized_final_line_without_newline() {
        let input = "x".repeat(MAX_MESSAGE_SIZE + 10);
        let mut reader = LineReader::new(input.as_bytes());

        let big: ProtocolResult<Option<EventMessage>> = reader.read_message().await;
        assert!(matches!(big, Err(ProtocolError::MessageTooLarge { .. })));

        let eof: Option<EventMessage> = reader.read_message().await.unwrap();
        assert!(eof.is_none());
    }

    #[tokio::test]
    async fn reader_empty_stream() {
        let mut reader = LineReader::new(&b""[..]);
        let result: Option<EventMessage> = reader.read_message().await.unwrap();
        assert!(result.is_none());
    }
}
