//! Utility functions for the SDK client.
//!
//! This module provides helper functions for:
//! - Stringifying JSON values for query strings and form fields
//! - Percent-encoding path parameters and the final request URL
//! - Appending routes to a host that may carry a base path

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value as JsonValue;
use url::Url;

/// Characters escaped when encoding an assembled URL.
///
/// Matches `encodeURI`: reserved URL delimiters stay literal. `%` is also kept
/// so parameters that were already encoded are not encoded twice.
const URI_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Render a JSON value the way it appears in a query string or form field.
///
/// Strings are used as-is, `null` becomes empty, arrays are joined with `,`,
/// and objects are JSON-encoded.
///
/// ```
/// use universal_sdk_client::client::stringify_value;
/// use serde_json::json;
///
/// assert_eq!(stringify_value(&json!("a b")), "a b");
/// assert_eq!(stringify_value(&json!([1, "x", true])), "1,x,true");
/// assert_eq!(stringify_value(&json!({"k": 1})), r#"{"k":1}"#);
/// ```
pub fn stringify_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(items) => items
            .iter()
            .map(stringify_value)
            .collect::<Vec<_>>()
            .join(","),
        JsonValue::Object(_) => value.to_string(),
    }
}

/// Encode one path parameter value (`encodeURIComponent`).
pub fn encode_path_param(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-encode an assembled URL without touching its delimiters.
pub fn encode_uri(url: &str) -> String {
    utf8_percent_encode(url, URI_ESCAPE).to_string()
}

/// Append `path` to `host`, keeping any base path the host carries.
///
/// ```
/// use universal_sdk_client::client::join_host;
/// use url::Url;
///
/// let host = Url::parse("https://api.example.com/iam/").unwrap();
/// assert_eq!(join_host(&host, "/openapi"), "https://api.example.com/iam/openapi");
/// assert_eq!(join_host(&host, "widgets"), "https://api.example.com/iam/widgets");
/// ```
pub fn join_host(host: &Url, path: &str) -> String {
    let base = host.as_str().trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(stringify_value(&json!(null)), "");
        assert_eq!(stringify_value(&json!(1.5)), "1.5");
        assert_eq!(stringify_value(&json!(false)), "false");
    }

    #[test]
    fn test_encode_path_param() {
        assert_eq!(encode_path_param("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_path_param("plain-id_1.2~"), "plain-id_1.2~");
    }

    #[test]
    fn test_encode_uri_keeps_delimiters() {
        assert_eq!(
            encode_uri("http://h/a b?q=x y&r=1#frag"),
            "http://h/a%20b?q=x%20y&r=1#frag"
        );
        assert_eq!(encode_uri("http://h/caf\u{e9}"), "http://h/caf%C3%A9");
    }

    #[test]
    fn test_encode_uri_does_not_double_encode() {
        assert_eq!(encode_uri("http://h/a%20b"), "http://h/a%20b");
    }
}
