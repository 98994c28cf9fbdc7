//! Response decoding.
//!
//! # Decode Flow
//!
//! 1. Look up `paths[route][method].responses[status]` in the cached
//!    document; a missing entry is a [`SdkError::SpecCoverage`] and nothing
//!    is read from the body
//! 2. Take the media type from `Content-Type` (default `application/json`)
//! 3. Remap it through the caller's [`ContentKindMap`], then classify it
//! 4. Decode by kind:
//!
//! | Kind | Result | Validated |
//! |------|--------|-----------|
//! | file | [`ResponsePayload::File`] when `Content-Disposition` names a file, else [`ResponsePayload::Blob`] | no |
//! | stream | [`ResponsePayload::Stream`] | per event |
//! | text | [`ResponsePayload::Text`] | no |
//! | json, multipart | [`ResponsePayload::Json`] | yes, then coerced |

use super::stream::{ByteStream, EventStream};
use crate::error::{Result, SdkError};
use crate::protocol::{attachment_filename, content_type, ContentKind, ContentKindMap};
use crate::registry::OpenApiDocument;
use crate::schema::{coerce_special_types, SchemaValidator};
use crate::types::{Blob, NamedFile, ResponseEnvelope, ResponsePayload, Value};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use http::{HeaderMap, Method};
use serde_json::Value as JsonValue;
use std::fmt;

/// Status, headers and an unread body.
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    body: ByteStream,
}

impl RawResponse {
    /// Wrap a reqwest response without reading its body.
    pub fn from_reqwest(response: reqwest::Response) -> Self {
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| SdkError::network(url.as_str(), e)))
            .boxed();
        RawResponse {
            status,
            headers,
            body,
        }
    }

    /// A response with a fully buffered body.
    pub fn from_bytes(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        RawResponse {
            status,
            headers,
            body: futures::stream::once(async move { Ok(body) }).boxed(),
        }
    }

    /// Read the whole body.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Network`] if the transport fails mid-body.
    pub async fn bytes(self) -> Result<Bytes> {
        let mut body = self.body;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    /// Hand over the unread body.
    pub fn into_body(self) -> ByteStream {
        self.body
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Decodes responses against one registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ResponseDecoder<'a> {
    document: &'a OpenApiDocument,
    content_kinds: &'a ContentKindMap,
    version: Option<&'a str>,
}

impl<'a> ResponseDecoder<'a> {
    /// Decode against `document`, remapping MIME types through `content_kinds`.
    pub fn new(document: &'a OpenApiDocument, content_kinds: &'a ContentKindMap) -> Self {
        ResponseDecoder {
            document,
            content_kinds,
            version: None,
        }
    }

    /// Look responses up only in the document stored under `version`.
    pub fn with_version(mut self, version: Option<&'a str>) -> Self {
        self.version = version;
        self
    }

    /// Decode `response` to the call `method route`.
    ///
    /// # Errors
    ///
    /// - [`SdkError::SpecCoverage`] if the document declares no such response
    /// - [`SdkError::Validation`] if a JSON body fails its schema
    /// - [`SdkError::Decode`] / [`SdkError::Json`] for unreadable payloads
    /// - [`SdkError::Network`] if the body cannot be read
    pub async fn decode(
        &self,
        route: &str,
        method: &Method,
        response: RawResponse,
    ) -> Result<ResponseEnvelope> {
        let status = response.status;
        let spec = self
            .document
            .find_versioned_response(route, method, status, self.version)
            .ok_or_else(|| SdkError::SpecCoverage {
                route: route.to_string(),
                method: method.as_str().to_ascii_lowercase(),
                status,
            })?;

        let media_type = content_type(&response.headers);
        let kind = ContentKind::classify(&self.content_kinds.resolve(&media_type));
        let schema = spec.schema_for(&media_type).cloned();
        let context = format!("{} {} {}", method, route, status);
        let headers = response.headers.clone();

        let payload = match kind {
            ContentKind::File => {
                let blob = Blob::new(response.bytes().await?).with_content_type(media_type);
                match attachment_filename(&headers) {
                    Some(name) => ResponsePayload::File(NamedFile::new(name, blob)),
                    None => ResponsePayload::Blob(blob),
                }
            }
            ContentKind::Stream => {
                let validator = schema
                    .map(|schema| SchemaValidator::compile(schema, context))
                    .transpose()?;
                ResponsePayload::Stream(EventStream::new(response.into_body(), validator))
            }
            ContentKind::Text => {
                let body = response.bytes().await?;
                ResponsePayload::Text(String::from_utf8_lossy(&body).into_owned())
            }
            ContentKind::Json | ContentKind::MultipartForm => {
                let body = response.bytes().await?;
                ResponsePayload::Json(decode_json(&body, schema, context)?)
            }
        };

        Ok(ResponseEnvelope {
            code: status,
            response: payload,
            headers,
        })
    }
}

/// Parse, validate and coerce a JSON body. An empty body is `null`.
fn decode_json(body: &[u8], schema: Option<JsonValue>, context: String) -> Result<Value> {
    let mut json = if body.iter().all(u8::is_ascii_whitespace) {
        JsonValue::Null
    } else {
        serde_json::from_slice(body)?
    };

    let Some(schema) = schema else {
        return Ok(Value::from(json));
    };

    let validator = SchemaValidator::compile(schema, context)?;
    validator.validate(&mut json)?;

    let mut value = Value::from(json);
    coerce_special_types(&mut value, validator.schema())?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
    use serde_json::json;

    fn document() -> OpenApiDocument {
        OpenApiDocument::new(json!({
            "openapi": "3.1.0",
            "paths": {
                "/widgets": {
                    "post": {
                        "responses": {
                            "201": {
                                "content": {"application/json": {"schema": {
                                    "type": "object",
                                    "required": ["id", "name"],
                                    "properties": {
                                        "id": {"type": "string"},
                                        "name": {"type": "string"},
                                        "createdAt": {"type": "string", "format": "date-time"}
                                    }
                                }}}
                            },
                            "204": {"description": "no content"}
                        }
                    }
                },
                "/report": {
                    "get": {"responses": {"200": {"content": {"application/octet-stream": {}}}}}
                },
                "/notes": {
                    "get": {"responses": {"200": {"content": {"text/plain": {"schema": {"type": "integer"}}}}}}
                },
                "/feed": {
                    "get": {"responses": {"200": {"content": {"application/x-ndjson": {
                        "schema": {"type": "object", "properties": {"n": {"type": "integer"}}}
                    }}}}}
                }
            }
        }))
    }

    fn headers(pairs: &[(http::header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(*value));
        }
        map
    }

    async fn decode(
        route: &str,
        method: Method,
        response: RawResponse,
        kinds: &ContentKindMap,
    ) -> Result<ResponseEnvelope> {
        let doc = document();
        ResponseDecoder::new(&doc, kinds).decode(route, &method, response).await
    }

    #[tokio::test]
    async fn test_json_validated_and_coerced() {
        let response = RawResponse::from_bytes(
            201,
            headers(&[(CONTENT_TYPE, "application/json; charset=utf-8")]),
            r#"{"id":"1","name":"a","createdAt":"2024-01-01T00:00:00Z"}"#,
        );
        let envelope = decode("/widgets", Method::POST, response, &ContentKindMap::new())
            .await
            .unwrap();

        assert_eq!(envelope.code, 201);
        let body = envelope.response.as_json().unwrap();
        let created = body.get("createdAt").unwrap().as_datetime().unwrap();
        assert_eq!(created.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_json_validation_failure() {
        let response = RawResponse::from_bytes(201, HeaderMap::new(), r#"{"id":"1"}"#);
        let err = decode("/widgets", Method::POST, response, &ContentKindMap::new())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("POST /widgets 201"));
    }

    #[tokio::test]
    async fn test_missing_status_is_spec_coverage() {
        let response = RawResponse::from_bytes(500, HeaderMap::new(), "not json at all");
        let err = decode("/widgets", Method::POST, response, &ContentKindMap::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SdkError::SpecCoverage { ref method, status: 500, .. } if method == "post"
        ));
    }

    #[tokio::test]
    async fn test_empty_body_without_schema_is_null() {
        let response = RawResponse::from_bytes(204, HeaderMap::new(), Bytes::new());
        let envelope = decode("/widgets", Method::POST, response, &ContentKindMap::new())
            .await
            .unwrap();
        assert!(envelope.response.as_json().unwrap().is_null());
    }

    #[tokio::test]
    async fn test_named_file() {
        let response = RawResponse::from_bytes(
            200,
            headers(&[
                (CONTENT_TYPE, "application/octet-stream"),
                (CONTENT_DISPOSITION, r#"attachment; filename="report 1.csv""#),
            ]),
            &b"a,b\n1,2\n"[..],
        );
        let envelope = decode("/report", Method::GET, response, &ContentKindMap::new())
            .await
            .unwrap();
        match envelope.response {
            ResponsePayload::File(file) => {
                assert_eq!(file.name(), "report 1.csv");
                assert_eq!(file.bytes(), &Bytes::from_static(b"a,b\n1,2\n"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unnamed_blob() {
        let response = RawResponse::from_bytes(
            200,
            headers(&[(CONTENT_TYPE, "application/octet-stream")]),
            vec![0u8, 1, 2],
        );
        let envelope = decode("/report", Method::GET, response, &ContentKindMap::new())
            .await
            .unwrap();
        assert!(matches!(envelope.response, ResponsePayload::Blob(ref b) if b.len() == 3));
    }

    #[tokio::test]
    async fn test_text_is_not_validated() {
        let response = RawResponse::from_bytes(
            200,
            headers(&[(CONTENT_TYPE, "text/plain")]),
            "not an integer",
        );
        let envelope = decode("/notes", Method::GET, response, &ContentKindMap::new())
            .await
            .unwrap();
        assert_eq!(envelope.response.as_text(), Some("not an integer"));
    }

    #[tokio::test]
    async fn test_content_kind_map_selects_stream() {
        let kinds = ContentKindMap::new().with("application/x-ndjson", ContentKind::Stream);
        let response = RawResponse::from_bytes(
            200,
            headers(&[(CONTENT_TYPE, "application/x-ndjson")]),
            "data: {\"n\": \"4\"}\n\n",
        );
        let envelope = decode("/feed", Method::GET, response, &kinds).await.unwrap();
        let mut events = envelope.response.into_stream().unwrap();
        let event = events.next().await.unwrap().unwrap();
        assert_eq!(event.data.to_json(), json!({"n": 4}));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let response = RawResponse::from_bytes(201, HeaderMap::new(), "{broken");
        let err = decode("/widgets", Method::POST, response, &ContentKindMap::new())
            .await
            .unwrap_err();
        assert!(err.is_decode());
    }
}
