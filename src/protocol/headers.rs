//! Response header parsing.
//!
//! # Header Formats
//!
//! | Header | Format | Example |
//! |--------|--------|---------|
//! | Content-Type | `{type}/{subtype}[; params]` | `application/json; charset=utf-8` |
//! | Content-Disposition | `{disposition}[; filename="..."][; filename*=charset''...]` | `attachment; filename="report 1.csv"` |
//!
//! # Examples
//!
//! ```
//! use universal_sdk_client::protocol::{parse_content_disposition_filename, parse_media_type};
//!
//! assert_eq!(parse_media_type("text/plain; charset=utf-8"), "text/plain");
//! assert_eq!(
//!     parse_content_disposition_filename(r#"attachment; filename="report 1.csv""#).as_deref(),
//!     Some("report 1.csv"),
//! );
//! ```

use super::constants::{headers as header_names, media_types};
use http::HeaderMap;
use regex::Regex;
use std::sync::LazyLock;

static FILENAME_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(filename\*?)\s*=\s*("(?:[^"\\]|\\.)*"|[^;]*)"#)
        .expect("filename pattern is valid")
});

/// Strip parameters from a `Content-Type` value and lowercase it.
///
/// Values that do not parse as a MIME type fall back to everything before the
/// first `;`.
pub fn parse_media_type(value: &str) -> String {
    match value.trim().parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
    }
}

/// Media type of a response, `application/json` when the header is absent.
pub fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header_names::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(parse_media_type)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| media_types::APPLICATION_JSON.to_string())
}

/// Extract the file name from a `Content-Disposition` value.
///
/// `filename*` wins over `filename`. Quotes are stripped, a `charset'lang'`
/// prefix is dropped, and the result is percent-decoded.
pub fn parse_content_disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for caps in FILENAME_PARAM.captures_iter(value) {
        let key = caps[1].to_ascii_lowercase();
        let raw = caps[2].trim();
        if key == "filename*" {
            // charset'language'value
            let encoded = raw.rsplit('\'').next().unwrap_or(raw);
            extended = Some(clean_filename(encoded));
        } else {
            plain = Some(clean_filename(raw));
        }
    }

    extended.or(plain).filter(|name| !name.is_empty())
}

/// File name advertised by a response, if any.
pub fn attachment_filename(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header_names::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition_filename)
}

fn clean_filename(raw: &str) -> String {
    let unquoted = raw.trim().trim_matches('"');
    match urlencoding::decode(unquoted) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => unquoted.to_string(),
    }
}
