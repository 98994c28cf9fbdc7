//! Uniform response envelope returned by every call.

use super::blob::{Blob, NamedFile};
use super::value::Value;
use crate::client::EventStream;
use http::HeaderMap;

/// `{code, response, headers}` for one call.
#[derive(Debug)]
pub struct ResponseEnvelope {
    /// HTTP status code
    pub code: u16,
    /// Decoded payload
    pub response: ResponsePayload,
    /// Response headers as received
    pub headers: HeaderMap,
}

/// Decoded response payload, selected by content kind.
#[derive(Debug)]
pub enum ResponsePayload {
    /// Validated and coerced JSON
    Json(Value),
    /// Raw `text/plain` body
    Text(String),
    /// Binary body without a file name
    Blob(Blob),
    /// Binary body named by `Content-Disposition`
    File(NamedFile),
    /// Lazy `text/event-stream` events
    Stream(EventStream),
}

impl ResponsePayload {
    /// The JSON value, if this is a JSON payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponsePayload::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Take the JSON value.
    pub fn into_json(self) -> Option<Value> {
        match self {
            ResponsePayload::Json(v) => Some(v),
            _ => None,
        }
    }

    /// The text, if this is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponsePayload::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Take the event stream.
    pub fn into_stream(self) -> Option<EventStream> {
        match self {
            ResponsePayload::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes of a blob or file payload.
    pub fn bytes(&self) -> Option<&bytes::Bytes> {
        match self {
            ResponsePayload::Blob(b) => Some(b.bytes()),
            ResponsePayload::File(f) => Some(f.bytes()),
            _ => None,
        }
    }
}

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Parsed, validated and coerced `data:` payload
    pub data: Value,
    /// Most recent `id:` seen on the stream
    pub id: Option<String>,
}
