//! Dynamic route descriptors.
//!
//! A route may be given as a literal, a regular expression, or a list of
//! alternatives. [`get_sdk_path`] turns any of them into one concrete path.
//!
//! # Examples
//!
//! ```
//! use universal_sdk_client::path::{get_sdk_path, SdkPath};
//! use regex::Regex;
//!
//! assert_eq!(get_sdk_path("/widgets").unwrap(), "/widgets");
//!
//! // Lists resolve to their last entry.
//! let alternatives = SdkPath::from(vec![SdkPath::from("/v1/widgets"), SdkPath::from("/v2/widgets")]);
//! assert_eq!(get_sdk_path(alternatives).unwrap(), "/v2/widgets");
//!
//! // Patterns resolve to a deterministic sample match.
//! let pattern = Regex::new(r"^/widgets/\d+$").unwrap();
//! assert_eq!(get_sdk_path(pattern).unwrap(), "/widgets/0");
//! ```

use crate::error::{Result, SdkError};
use regex::Regex;
use regex_syntax::hir::{Class, Hir, HirKind};

/// Characters tried, in order, when a class must be sampled.
const PREFERRED_CHARS: [char; 6] = ['a', '0', 'A', '-', '_', '.'];

/// A route descriptor.
#[derive(Debug, Clone)]
pub enum SdkPath {
    /// Used as-is
    Literal(String),
    /// Stands in for any path the pattern matches
    Pattern(Regex),
    /// The last entry is used
    Alternatives(Vec<SdkPath>),
}

impl From<&str> for SdkPath {
    fn from(path: &str) -> Self {
        SdkPath::Literal(path.to_string())
    }
}

impl From<String> for SdkPath {
    fn from(path: String) -> Self {
        SdkPath::Literal(path)
    }
}

impl From<&String> for SdkPath {
    fn from(path: &String) -> Self {
        SdkPath::Literal(path.clone())
    }
}

impl From<Regex> for SdkPath {
    fn from(pattern: Regex) -> Self {
        SdkPath::Pattern(pattern)
    }
}

impl From<Vec<SdkPath>> for SdkPath {
    fn from(paths: Vec<SdkPath>) -> Self {
        SdkPath::Alternatives(paths)
    }
}

/// Resolve a route descriptor to one concrete path.
///
/// # Errors
///
/// Returns [`SdkError::Configuration`] if the descriptor resolves to nothing
/// (empty string, empty list) or a pattern has no sample match.
pub fn get_sdk_path(path: impl Into<SdkPath>) -> Result<String> {
    let resolved = match path.into() {
        SdkPath::Literal(path) => path,
        SdkPath::Pattern(pattern) => sample_match(&pattern)?,
        SdkPath::Alternatives(mut paths) => match paths.pop() {
            Some(last) => return get_sdk_path(last),
            None => String::new(),
        },
    };

    if resolved.is_empty() {
        return Err(SdkError::Configuration("resolved SDK path is empty".into()));
    }
    Ok(resolved)
}

/// Generate one string matched by `pattern`.
///
/// The walk is deterministic: alternations take their first branch,
/// repetitions their minimum count, and classes a readable member when one
/// exists.
pub fn sample_match(pattern: &Regex) -> Result<String> {
    let hir = regex_syntax::Parser::new()
        .parse(pattern.as_str())
        .map_err(|e| SdkError::Configuration(format!("invalid path pattern: {}", e)))?;

    let mut out = String::new();
    write_sample(&hir, &mut out);

    if !pattern.is_match(&out) {
        return Err(SdkError::Configuration(format!(
            "could not derive a path from pattern {}",
            pattern.as_str()
        )));
    }
    Ok(out)
}

fn write_sample(hir: &Hir, out: &mut String) {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => {}
        HirKind::Literal(literal) => out.push_str(&String::from_utf8_lossy(&literal.0)),
        HirKind::Class(class) => {
            if let Some(c) = sample_class(class) {
                out.push(c);
            }
        }
        HirKind::Repetition(rep) => {
            for _ in 0..rep.min {
                write_sample(&rep.sub, out);
            }
        }
        HirKind::Capture(capture) => write_sample(&capture.sub, out),
        HirKind::Concat(parts) => {
            for part in parts {
                write_sample(part, out);
            }
        }
        HirKind::Alternation(branches) => {
            if let Some(first) = branches.first() {
                write_sample(first, out);
            }
        }
    }
}

fn sample_class(class: &Class) -> Option<char> {
    match class {
        Class::Unicode(unicode) => {
            let ranges = unicode.ranges();
            PREFERRED_CHARS
                .iter()
                .copied()
                .find(|c| ranges.iter().any(|r| r.start() <= *c && *c <= r.end()))
                .or_else(|| ranges.first().map(|r| r.start()))
        }
        Class::Bytes(bytes) => {
            let ranges = bytes.ranges();
            PREFERRED_CHARS
                .iter()
                .copied()
                .find(|c| {
                    c.is_ascii()
                        && ranges
                            .iter()
                            .any(|r| r.start() <= *c as u8 && *c as u8 <= r.end())
                })
                .or_else(|| ranges.first().map(|r| char::from(r.start())))
        }
    }
}
