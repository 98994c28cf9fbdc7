//! Lazy server-sent event streams.
//!
//! An [`EventStream`] owns the response body reader and pulls from it only
//! when the consumer asks for the next event. Each `data:` payload is parsed
//! as JSON, validated against the response schema, coerced, and yielded as an
//! [`SseEvent`].
//!
//! # Lifecycle
//!
//! 1. Created by the client for a `text/event-stream` response
//! 2. Yields events through [`EventStream::next`] or the [`Stream`] impl
//! 3. Ends when the server closes the body, on the first error, or on
//!    [`EventStream::close`]
//!
//! Any error (transport, unparsable data, failed validation) is yielded once
//! and the stream is closed; no further events follow and nothing reconnects.
//!
//! # Examples
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let envelope = client.get("/events", SdkRequest::new()).await?;
//! let mut events = envelope.response.into_stream().unwrap();
//!
//! while let Some(event) = events.next().await {
//!     let event = event?;
//!     println!("{:?}: {:?}", event.id, event.data);
//! }
//! ```

use super::parser::{RawEvent, SseParser};
use crate::error::{Result, SdkError};
use crate::schema::{coerce_special_types, SchemaValidator};
use crate::types::{SseEvent, Value};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Boxed source of body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A lazy, single-pass sequence of validated events.
pub struct EventStream {
    /// `None` once closed
    reader: Option<ByteStream>,
    parser: SseParser,
    pending: VecDeque<RawEvent>,
    validator: Option<SchemaValidator>,
    finished: bool,
}

impl EventStream {
    /// Wrap a chunk stream. Events are validated with `validator` if given.
    pub fn new<S>(reader: S, validator: Option<SchemaValidator>) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        EventStream {
            reader: Some(reader.boxed()),
            parser: SseParser::new(),
            pending: VecDeque::new(),
            validator,
            finished: false,
        }
    }

    /// Receive the next event.
    ///
    /// - `Some(Ok(event))` - an event was decoded
    /// - `Some(Err(e))` - decoding failed; the stream is now closed
    /// - `None` - the stream is exhausted or closed
    pub async fn next(&mut self) -> Option<Result<SseEvent>> {
        futures::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Release the underlying reader. Later calls to `next` return `None`.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            tracing::debug!("event stream closed");
        }
        self.pending.clear();
        self.finished = true;
    }

    /// Whether the stream has ended.
    pub fn is_closed(&self) -> bool {
        self.finished
    }

    /// Most recent `id:` seen on the stream.
    pub fn last_event_id(&self) -> Option<&str> {
        self.parser.last_event_id()
    }

    fn decode(&self, raw: RawEvent) -> Result<SseEvent> {
        let mut data: JsonValue = serde_json::from_str(&raw.data)
            .map_err(|e| SdkError::Decode(format!("invalid event data {:?}: {}", raw.data, e)))?;

        let value = match &self.validator {
            Some(validator) => {
                validator.validate(&mut data)?;
                let mut value = Value::from(data);
                coerce_special_types(&mut value, validator.schema())?;
                value
            }
            None => Value::from(data),
        };

        Ok(SseEvent {
            data: value,
            id: raw.id,
        })
    }

    fn fail(&mut self, err: SdkError) -> Poll<Option<Result<SseEvent>>> {
        tracing::warn!(error = %err, "event stream aborted");
        self.close();
        Poll::Ready(Some(Err(err)))
    }
}

impl Stream for EventStream {
    type Item = Result<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if let Some(raw) = this.pending.pop_front() {
                return match this.decode(raw) {
                    Ok(event) => Poll::Ready(Some(Ok(event))),
                    Err(err) => this.fail(err),
                };
            }

            let Some(reader) = this.reader.as_mut() else {
                this.finished = true;
                return Poll::Ready(None);
            };

            match reader.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => {
                    let events = this.parser.feed(&chunk);
                    this.pending.extend(events);
                }
                Poll::Ready(Some(Err(err))) => return this.fail(err),
                Poll::Ready(None) => {
                    this.reader = None;
                    if let Some(last) = this.parser.finish() {
                        this.pending.push_back(last);
                    }
                }
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("parser", &self.parser)
            .field("pending", &self.pending.len())
            .field("validator", &self.validator.as_ref().map(SchemaValidator::context))
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        let items: Vec<Result<Bytes>> = parts
            .iter()
            .map(|&p| Ok(Bytes::from_static(p.as_bytes())))
            .collect();
        futures::stream::iter(items)
    }

    fn tick_validator() -> SchemaValidator {
        SchemaValidator::compile(
            json!({
                "type": "object",
                "required": ["n"],
                "properties": {
                    "n": {"type": "integer"},
                    "at": {"type": "string", "format": "date-time"}
                }
            }),
            "GET /ticks 200",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_two_events_across_three_chunks() {
        let mut stream = EventStream::new(
            chunks(&[
                "id: 1\ndata: {\"n\": 1, \"at\": \"2024-01-01T00:00:00Z\"}\n\nid: 2\nda",
                "ta: {\"n\"",
                ": 2}\n\n",
            ]),
            Some(tick_validator()),
        );

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.id.as_deref(), Some("1"));
        assert!(first.data.get("at").unwrap().as_datetime().is_some());

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.id.as_deref(), Some("2"));
        assert_eq!(second.data.to_json(), json!({"n": 2}));

        assert!(stream.next().await.is_none());
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn test_validation_failure_ends_stream() {
        let mut stream = EventStream::new(
            chunks(&["data: {\"n\": 1}\n\ndata: {\"m\": 1}\n\ndata: {\"n\": 3}\n\n"]),
            Some(tick_validator()),
        );

        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.is_validation());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_unparsable_data_is_decode_error() {
        let mut stream = EventStream::new(chunks(&["data: {oops\n\n"]), None);
        assert!(stream.next().await.unwrap().unwrap_err().is_decode());
    }

    #[tokio::test]
    async fn test_trailing_event_without_newline() {
        let mut stream = EventStream::new(chunks(&["id: x\ndata: [1, 2]"]), None);
        let event = stream.next().await.unwrap().unwrap();
        assert_eq!(event.id.as_deref(), Some("x"));
        assert_eq!(event.data.to_json(), json!([1, 2]));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_closes_stream() {
        let items: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: 1\n")),
            Err(SdkError::network("http://h/events", "connection reset")),
            Ok(Bytes::from_static(b"data: 2\n")),
        ];
        let mut stream = EventStream::new(futures::stream::iter(items), None);

        assert_eq!(stream.next().await.unwrap().unwrap().data.to_json(), json!(1));
        assert!(stream.next().await.unwrap().unwrap_err().is_network());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_close_releases_reader() {
        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Bytes>>();
        let mut stream = EventStream::new(rx, None);

        tx.unbounded_send(Ok(Bytes::from_static(b"data: 1\n"))).unwrap();
        assert!(stream.next().await.unwrap().is_ok());

        stream.close();
        assert!(tx.is_closed());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_ext_combinators() {
        let stream = EventStream::new(chunks(&["data: 1\n", "data: 2\n", "data: 3\n"]), None);
        let values: Vec<_> = stream
            .filter_map(|event| async move { event.ok() })
            .map(|event| event.data.to_json())
            .collect()
            .await;
        assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
    }
}
