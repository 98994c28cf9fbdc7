//! Request descriptors accepted by the client's verb methods.

use super::blob::{Blob, NamedFile};
use crate::error::{Result, SdkError};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Keys that select a body kind in a descriptor object.
const BODY_DISCRIMINANTS: [&str; 6] = [
    "json",
    "text",
    "file",
    "multipartForm",
    "urlEncodedForm",
    "schema",
];

/// A single value of a multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// Sent verbatim
    Text(String),
    /// Stringified before sending
    Json(JsonValue),
    /// Appended as a binary part
    Blob(Blob),
    /// Appended as a binary part with a file name
    File(NamedFile),
    /// Each element is appended under the same field name
    List(Vec<FormValue>),
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::Text(s)
    }
}

impl From<Blob> for FormValue {
    fn from(blob: Blob) -> Self {
        FormValue::Blob(blob)
    }
}

impl From<NamedFile> for FormValue {
    fn from(file: NamedFile) -> Self {
        FormValue::File(file)
    }
}

impl From<JsonValue> for FormValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::String(s) => FormValue::Text(s),
            JsonValue::Array(items) => {
                FormValue::List(items.into_iter().map(FormValue::from).collect())
            }
            other => FormValue::Json(other),
        }
    }
}

/// Request body, one shape per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON-stringified, `application/json`
    Json(JsonValue),
    /// Same encoding as [`RequestBody::Json`]
    Schema(JsonValue),
    /// Sent verbatim, `text/plain`
    Text(String),
    /// Raw bytes, `application/octet-stream`
    File(Blob),
    /// `multipart/form-data`, boundary chosen by the transport
    MultipartForm(Vec<(String, FormValue)>),
    /// `application/x-www-form-urlencoded`
    UrlEncodedForm(Vec<(String, JsonValue)>),
}

impl From<JsonValue> for RequestBody {
    /// A bare value is sent as JSON.
    fn from(value: JsonValue) -> Self {
        RequestBody::Json(value)
    }
}

impl RequestBody {
    /// Parse a descriptor object such as `{"text": "hi", "contentType": "text/csv"}`.
    ///
    /// Returns the body and the explicit content type, if one was given. An
    /// object without any discriminant key is a bare JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] if more than one discriminant is
    /// present or a form descriptor is not an object.
    pub fn from_descriptor(descriptor: JsonValue) -> Result<(RequestBody, Option<String>)> {
        let mut map = match descriptor {
            JsonValue::Object(map) => map,
            other => return Ok((RequestBody::Json(other), None)),
        };

        let present: Vec<&str> = BODY_DISCRIMINANTS
            .iter()
            .copied()
            .filter(|key| map.contains_key(*key))
            .collect();

        let key = match present.as_slice() {
            [] => return Ok((RequestBody::Json(JsonValue::Object(map)), None)),
            [key] => *key,
            many => {
                return Err(SdkError::Configuration(format!(
                    "request body sets more than one kind: {}",
                    many.join(", ")
                )))
            }
        };

        let content_type = map
            .remove("contentType")
            .and_then(|v| v.as_str().map(str::to_string));
        let value = map.remove(key).unwrap_or(JsonValue::Null);

        let body = match key {
            "json" => RequestBody::Json(value),
            "schema" => RequestBody::Schema(value),
            "text" => RequestBody::Text(match value {
                JsonValue::String(s) => s,
                other => other.to_string(),
            }),
            "file" => RequestBody::File(Blob::new(match value {
                JsonValue::String(s) => s.into_bytes(),
                other => other.to_string().into_bytes(),
            })),
            "multipartForm" => RequestBody::MultipartForm(
                expect_object(key, value)?
                    .into_iter()
                    .map(|(k, v)| (k, FormValue::from(v)))
                    .collect(),
            ),
            _ => RequestBody::UrlEncodedForm(expect_object(key, value)?.into_iter().collect()),
        };

        Ok((body, content_type))
    }
}

fn expect_object(key: &str, value: JsonValue) -> Result<serde_json::Map<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(SdkError::Configuration(format!(
            "{} body must be an object, got {}",
            key, other
        ))),
    }
}

/// Everything a caller can attach to one call.
///
/// # Examples
///
/// ```
/// use universal_sdk_client::SdkRequest;
/// use serde_json::json;
///
/// let request = SdkRequest::new()
///     .with_param("id", 42)
///     .with_query("expand", "owner")
///     .with_header("Authorization", "Bearer token")
///     .json(json!({"name": "a"}));
/// assert_eq!(request.params["id"], "42");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SdkRequest {
    /// Values substituted for `:name` tokens in the route
    pub params: BTreeMap<String, String>,
    /// Query string pairs, stringified on encode
    pub query: Vec<(String, JsonValue)>,
    /// Headers passed through verbatim
    pub headers: BTreeMap<String, String>,
    /// Optional body
    pub body: Option<RequestBody>,
    /// Overrides the body's default content type
    pub content_type: Option<String>,
}

impl SdkRequest {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a path parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Append a query pair.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Override the default content type of the body.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// JSON body.
    pub fn json(self, value: JsonValue) -> Self {
        self.with_body(RequestBody::Json(value))
    }

    /// Plain text body.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.with_body(RequestBody::Text(text.into()))
    }

    /// Binary body.
    pub fn file(self, blob: impl Into<Blob>) -> Self {
        self.with_body(RequestBody::File(blob.into()))
    }

    /// Multipart form body.
    pub fn multipart<K, V>(self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FormValue>,
    {
        self.with_body(RequestBody::MultipartForm(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// URL-encoded form body.
    pub fn url_encoded<K, V>(self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<JsonValue>,
    {
        self.with_body(RequestBody::UrlEncodedForm(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }
}
