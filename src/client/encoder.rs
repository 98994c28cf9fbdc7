//! Request encoding.
//!
//! Turns a route template and an [`SdkRequest`] into a transport-ready
//! [`EncodedRequest`]:
//!
//! 1. the first `:name` token per parameter is replaced by the encoded value
//! 2. query pairs are stringified and form-encoded, appended only when non-empty
//! 3. the body is encoded by kind, picking a default `Content-Type`
//! 4. default headers, the computed content type and caller headers are merged
//!    (caller wins; multipart drops `Content-Type` so the boundary is generated)
//! 5. the assembled URL is percent-encoded as a whole
//!
//! | Body | Default `Content-Type` |
//! |------|------------------------|
//! | `Json`, `Schema` | `application/json` |
//! | `Text` | `text/plain` |
//! | `File` | blob content type, else `application/octet-stream` |
//! | `MultipartForm` | none (set by the transport) |
//! | `UrlEncodedForm` | `application/x-www-form-urlencoded` |

use super::utils::{encode_path_param, encode_uri, join_host, stringify_value};
use crate::error::{Result, SdkError};
use crate::protocol::constants::{headers as header_names, media_types};
use crate::types::{FormValue, RequestBody, SdkRequest};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use url::Url;

/// A request ready to hand to the transport.
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    /// HTTP method
    pub method: Method,
    /// Fully assembled, percent-encoded URL
    pub url: String,
    /// Merged headers
    pub headers: HeaderMap,
    /// Encoded body
    pub body: EncodedBody,
}

/// Encoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedBody {
    /// No body
    Empty,
    /// Raw bytes, described by the `Content-Type` header
    Bytes(Bytes),
    /// Multipart parts, in order
    Multipart(Vec<MultipartPart>),
}

/// One multipart form part.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    /// Field name
    pub name: String,
    /// Part payload
    pub value: PartValue,
}

/// Payload of a multipart part.
#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    /// Text field
    Text(String),
    /// Binary field
    Binary {
        /// Content
        bytes: Bytes,
        /// File name, when the value was a named file
        file_name: Option<String>,
        /// Part content type
        content_type: Option<String>,
    },
}

impl EncodedRequest {
    /// Header value as text, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Convert into a reqwest request builder on `client`.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] if a multipart part declares an
    /// invalid content type.
    pub fn into_reqwest(self, client: &reqwest::Client) -> Result<reqwest::RequestBuilder> {
        let builder = client
            .request(self.method, self.url)
            .headers(self.headers);

        Ok(match self.body {
            EncodedBody::Empty => builder,
            EncodedBody::Bytes(bytes) => builder.body(bytes),
            EncodedBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        })
    }
}

fn build_form(parts: Vec<MultipartPart>) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part.value {
            PartValue::Text(text) => form.text(part.name, text),
            PartValue::Binary {
                bytes,
                file_name,
                content_type,
            } => {
                let mut binary = reqwest::multipart::Part::bytes(bytes.to_vec());
                if let Some(file_name) = file_name {
                    binary = binary.file_name(file_name);
                }
                if let Some(content_type) = content_type {
                    binary = binary.mime_str(&content_type).map_err(|e| {
                        SdkError::Configuration(format!(
                            "invalid content type {:?} for part {}: {}",
                            content_type, part.name, e
                        ))
                    })?;
                }
                form.part(part.name, binary)
            }
        };
    }
    Ok(form)
}

/// Build the request for `method route` on `host`.
///
/// `default_headers` come from configuration and lose to both the computed
/// content type and the request's own headers.
///
/// # Errors
///
/// Returns [`SdkError::Configuration`] for header names or values that are not
/// valid HTTP, and for query or form values that cannot be encoded.
///
/// # Examples
///
/// ```
/// use universal_sdk_client::client::encode_request;
/// use universal_sdk_client::SdkRequest;
/// use http::Method;
/// use serde_json::json;
/// use url::Url;
///
/// let host = Url::parse("http://api.local").unwrap();
/// let request = SdkRequest::new()
///     .with_param("id", "a b")
///     .with_query("expand", "owner")
///     .json(json!({"name": "a"}));
/// let encoded = encode_request(&host, Method::PUT, "/widgets/:id", request, &Default::default()).unwrap();
/// assert_eq!(encoded.url, "http://api.local/widgets/a%20b?expand=owner");
/// assert_eq!(encoded.header("content-type"), Some("application/json"));
/// ```
pub fn encode_request(
    host: &Url,
    method: Method,
    route: &str,
    request: SdkRequest,
    default_headers: &BTreeMap<String, String>,
) -> Result<EncodedRequest> {
    let SdkRequest {
        params,
        query,
        headers,
        body,
        content_type,
    } = request;

    let path = substitute_path_params(route, &params);
    let query = serialize_query(&query)?;

    let mut url = join_host(host, &path);
    if !query.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }

    let (body, default_content_type) = match body {
        Some(body) => encode_body(body)?,
        None => (EncodedBody::Empty, None),
    };
    let multipart = matches!(body, EncodedBody::Multipart(_));

    let mut merged = HeaderMap::new();
    for (name, value) in default_headers {
        insert_header(&mut merged, name, value)?;
    }
    if !multipart {
        if let Some(content_type) = content_type.or(default_content_type) {
            insert_header(&mut merged, header_names::CONTENT_TYPE.as_str(), &content_type)?;
        }
    }
    for (name, value) in &headers {
        insert_header(&mut merged, name, value)?;
    }
    if multipart {
        merged.remove(header_names::CONTENT_TYPE);
    }

    Ok(EncodedRequest {
        method,
        url: encode_uri(&url),
        headers: merged,
        body,
    })
}

/// Replace the first `:key` token for every parameter.
///
/// ```
/// use universal_sdk_client::client::substitute_path_params;
/// use std::collections::BTreeMap;
///
/// let params = BTreeMap::from([("id".to_string(), "7".to_string())]);
/// assert_eq!(substitute_path_params("/widgets/:id/parts/:id", &params), "/widgets/7/parts/:id");
/// ```
pub fn substitute_path_params(route: &str, params: &BTreeMap<String, String>) -> String {
    // Longer keys first, so `:id` never eats the prefix of `:idx`.
    let mut ordered: Vec<(&String, &String)> = params.iter().collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut path = route.to_string();
    for (key, value) in ordered {
        let token = format!(":{}", key);
        if let Some(start) = find_token(&path, &token) {
            path.replace_range(start..start + token.len(), &encode_path_param(value));
        }
    }
    path
}

fn find_token(path: &str, token: &str) -> Option<usize> {
    path.match_indices(token)
        .map(|(start, _)| start)
        .find(|&start| {
            path[start + token.len()..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'))
        })
}

/// Form-encode query pairs after stringifying their values.
///
/// # Errors
///
/// Returns [`SdkError::Configuration`] if encoding fails.
pub fn serialize_query(query: &[(String, JsonValue)]) -> Result<String> {
    let pairs: Vec<(&str, String)> = query
        .iter()
        .map(|(name, value)| (name.as_str(), stringify_value(value)))
        .collect();
    serde_urlencoded::to_string(&pairs)
        .map_err(|e| SdkError::Configuration(format!("failed to encode query: {}", e)))
}

fn encode_body(body: RequestBody) -> Result<(EncodedBody, Option<String>)> {
    Ok(match body {
        RequestBody::Json(value) | RequestBody::Schema(value) => (
            EncodedBody::Bytes(Bytes::from(serde_json::to_vec(&value)?)),
            Some(media_types::APPLICATION_JSON.to_string()),
        ),
        RequestBody::Text(text) => (
            EncodedBody::Bytes(Bytes::from(text)),
            Some(media_types::TEXT_PLAIN.to_string()),
        ),
        RequestBody::File(blob) => {
            let content_type = blob
                .content_type()
                .unwrap_or(media_types::OCTET_STREAM)
                .to_string();
            (EncodedBody::Bytes(blob.into_bytes()), Some(content_type))
        }
        RequestBody::MultipartForm(fields) => {
            let mut parts = Vec::new();
            for (name, value) in fields {
                push_parts(&mut parts, name, value);
            }
            (EncodedBody::Multipart(parts), None)
        }
        RequestBody::UrlEncodedForm(fields) => {
            let pairs: Vec<(String, String)> = fields
                .iter()
                .map(|(name, value)| (name.clone(), stringify_value(value)))
                .collect();
            let encoded = serde_urlencoded::to_string(&pairs)
                .map_err(|e| SdkError::Configuration(format!("failed to encode form: {}", e)))?;
            (
                EncodedBody::Bytes(Bytes::from(encoded)),
                Some(media_types::URL_ENCODED_FORM.to_string()),
            )
        }
    })
}

fn push_parts(parts: &mut Vec<MultipartPart>, name: String, value: FormValue) {
    let value = match value {
        FormValue::List(items) => {
            for item in items {
                push_parts(parts, name.clone(), item);
            }
            return;
        }
        FormValue::Text(text) => PartValue::Text(text),
        FormValue::Json(json) => PartValue::Text(stringify_value(&json)),
        FormValue::Blob(blob) => PartValue::Binary {
            content_type: blob.content_type().map(str::to_string),
            bytes: blob.into_bytes(),
            file_name: None,
        },
        FormValue::File(file) => PartValue::Binary {
            file_name: Some(file.name().to_string()),
            content_type: file.blob().content_type().map(str::to_string),
            bytes: file.into_blob().into_bytes(),
        },
    };
    parts.push(MultipartPart { name, value });
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| SdkError::Configuration(format!("invalid header name {:?}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| SdkError::Configuration(format!("invalid value for header {}: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}
