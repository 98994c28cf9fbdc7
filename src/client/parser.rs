//! Incremental parser for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; a chunk may end in the middle of a line
//! or even inside a multi-byte UTF-8 sequence. The parser buffers raw bytes
//! and only decodes complete lines.
//!
//! # Parsing Flow
//!
//! 1. **AwaitingLine**: append the chunk, then split off every complete line
//!    - `id: <value>` updates the sticky last event id
//!    - `data: <payload>` emits an event carrying the current id
//!    - anything else (comments, `event:`, blank separators) is skipped
//! 2. **StreamDone**: the reader is exhausted; a trailing partial line is
//!    flushed once and further input is ignored
//!
//! # Examples
//!
//! ```
//! use universal_sdk_client::client::{ParseState, SseParser};
//!
//! let mut parser = SseParser::new();
//! assert!(parser.feed(b"id: 1\nda").is_empty());
//!
//! let events = parser.feed(b"ta: {\"n\":1}\n\n");
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].data, "{\"n\":1}");
//! assert_eq!(events[0].id.as_deref(), Some("1"));
//!
//! assert!(parser.finish().is_none());
//! assert_eq!(parser.state(), ParseState::StreamDone);
//! ```

use bytes::BytesMut;

const ID_PREFIX: &str = "id:";
const DATA_PREFIX: &str = "data:";

/// Parse state for the event-stream parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Accepting chunks and splitting lines
    AwaitingLine,
    /// Underlying reader finished
    StreamDone,
}

/// One `data:` line with the id in effect when it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Trimmed text after `data:`
    pub data: String,
    /// Last `id:` seen on the stream
    pub id: Option<String>,
}

/// Line-oriented server-sent events parser.
#[derive(Debug)]
pub struct SseParser {
    /// Bytes not yet terminated by a newline
    buffer: BytesMut,
    /// Prefix of `buffer` already known to hold no newline
    scanned: usize,
    state: ParseState,
    /// Sticky across events until overwritten
    last_event_id: Option<String>,
}

impl SseParser {
    /// Create a new parser
    pub fn new() -> Self {
        SseParser {
            buffer: BytesMut::with_capacity(4096),
            scanned: 0,
            state: ParseState::AwaitingLine,
            last_event_id: None,
        }
    }

    /// Feed a chunk and collect every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        if self.state == ParseState::StreamDone {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let newline = self.scanned + offset;
            let line = self.buffer.split_to(newline + 1);
            self.scanned = 0;
            if let Some(event) = self.process_line(&line[..newline]) {
                events.push(event);
            }
        }
        self.scanned = self.buffer.len();
        events
    }

    /// Mark the stream finished and flush a trailing unterminated line.
    pub fn finish(&mut self) -> Option<RawEvent> {
        if self.state == ParseState::StreamDone {
            return None;
        }
        self.state = ParseState::StreamDone;

        // `feed` leaves no newline behind, so the remainder is one line.
        let rest = self.buffer.split();
        self.scanned = 0;
        if rest.is_empty() {
            return None;
        }
        self.process_line(&rest[..])
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<RawEvent> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();

        if let Some(id) = line.strip_prefix(ID_PREFIX) {
            self.last_event_id = Some(id.trim().to_string());
            None
        } else if let Some(data) = line.strip_prefix(DATA_PREFIX) {
            Some(RawEvent {
                data: data.trim().to_string(),
                id: self.last_event_id.clone(),
            })
        } else {
            None
        }
    }

    /// Get current parse state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Most recent `id:` value.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Bytes buffered but not yet terminated by a newline.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_creation() {
        let parser = SseParser::new();
        assert_eq!(parser.state(), ParseState::AwaitingLine);
        assert!(parser.last_event_id().is_none());
    }

    #[test]
    fn test_split_across_chunks() {
        let mut parser = SseParser::new();
        let mut events = Vec::new();
        for chunk in [&b"id: a\ndata: {\"n\""[..], b":1}\n\nid: b\nda", b"ta: {\"n\":2}\n\n"] {
            events.extend(parser.feed(chunk));
        }
        assert_eq!(
            events,
            vec![
                RawEvent { data: "{\"n\":1}".into(), id: Some("a".into()) },
                RawEvent { data: "{\"n\":2}".into(), id: Some("b".into()) },
            ]
        );
        assert!(parser.pending().is_empty());
    }

    #[test]
    fn test_id_is_sticky() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"id: 7\ndata: 1\n\ndata: 2\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].id.as_deref(), Some("7"));
    }

    #[test]
    fn test_crlf_and_comments() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": keep-alive\r\nevent: tick\r\ndata: true\r\n\r\n");
        assert_eq!(events, vec![RawEvent { data: "true".into(), id: None }]);
    }

    #[test]
    fn test_multibyte_split() {
        let text = "data: \"caf\u{e9}\"\n".as_bytes();
        let split = text.len() - 3;
        let mut parser = SseParser::new();
        assert!(parser.feed(&text[..split]).is_empty());
        let events = parser.feed(&text[split..]);
        assert_eq!(events[0].data, "\"caf\u{e9}\"");
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"id: 9\ndata: 42").is_empty());
        let last = parser.finish().unwrap();
        assert_eq!(last, RawEvent { data: "42".into(), id: Some("9".into()) });
        assert!(parser.finish().is_none());
        assert!(parser.feed(b"data: 1\n").is_empty());
    }

    #[test]
    fn test_long_line_in_small_chunks() {
        let payload = format!("\"{}\"", "x".repeat(10_000));
        let line = format!("data: {}\n", payload);
        let mut parser = SseParser::new();
        let mut events = Vec::new();
        for chunk in line.as_bytes().chunks(7) {
            events.extend(parser.feed(chunk));
        }
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, payload);
        assert!(parser.pending().is_empty());
    }

    #[test]
    fn test_finish_after_partial_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: ").is_empty());
        assert!(parser.feed(b"[1,").is_empty());
        assert!(parser.feed(b"2]").is_empty());
        assert_eq!(parser.finish().unwrap().data, "[1,2]");
    }

    #[test]
    fn test_finish_without_data() {
        let mut parser = SseParser::new();
        parser.feed(b"data: 1\n");
        assert!(parser.finish().is_none());
    }
}
