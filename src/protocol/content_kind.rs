//! Content kinds and the caller-supplied MIME override map.
//!
//! The decoder only knows five kinds of payload. Servers may label them with
//! exotic MIME types (`application/vnd.acme+csv`, `application/x-ndjson`, ...);
//! a [`ContentKindMap`] lets the caller fold those back onto a known kind.
//!
//! ```
//! use universal_sdk_client::protocol::{ContentKind, ContentKindMap};
//!
//! let map = ContentKindMap::new().with("application/vnd.acme+csv", ContentKind::Text);
//! assert_eq!(map.resolve("application/vnd.acme+csv"), "text/plain");
//! assert_eq!(map.resolve("application/json"), "application/json");
//! ```

use super::constants::media_types;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Payload kinds understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    /// `application/json`
    Json,
    /// `application/octet-stream`
    File,
    /// `text/plain`
    Text,
    /// `text/event-stream`
    Stream,
    /// `multipart/form-data`
    MultipartForm,
}

impl ContentKind {
    /// Canonical MIME type for this kind.
    pub fn mime(self) -> &'static str {
        match self {
            ContentKind::Json => media_types::APPLICATION_JSON,
            ContentKind::File => media_types::OCTET_STREAM,
            ContentKind::Text => media_types::TEXT_PLAIN,
            ContentKind::Stream => media_types::EVENT_STREAM,
            ContentKind::MultipartForm => media_types::MULTIPART_FORM,
        }
    }

    /// Classify a bare MIME type. Anything unrecognized is JSON.
    pub fn classify(mime: &str) -> ContentKind {
        match mime {
            media_types::OCTET_STREAM => ContentKind::File,
            media_types::EVENT_STREAM => ContentKind::Stream,
            media_types::TEXT_PLAIN => ContentKind::Text,
            media_types::MULTIPART_FORM => ContentKind::MultipartForm,
            _ => ContentKind::Json,
        }
    }
}

/// Caller-supplied mapping from raw MIME types to content kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContentKindMap {
    entries: HashMap<String, ContentKind>,
}

impl ContentKindMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping. MIME types are matched case-insensitively.
    pub fn with(mut self, mime: impl Into<String>, kind: ContentKind) -> Self {
        self.insert(mime, kind);
        self
    }

    /// Add a mapping in place.
    pub fn insert(&mut self, mime: impl Into<String>, kind: ContentKind) {
        self.entries.insert(mime.into().to_ascii_lowercase(), kind);
    }

    /// Kind declared for `mime`, if any.
    pub fn get(&self, mime: &str) -> Option<ContentKind> {
        self.entries
            .get(mime)
            .or_else(|| self.entries.get(&mime.to_ascii_lowercase()))
            .copied()
    }

    /// Remap `content_type` to its declared kind's MIME type, or return it unchanged.
    pub fn resolve(&self, content_type: &str) -> String {
        match self.get(content_type) {
            Some(kind) => kind.mime().to_string(),
            None => content_type.to_string(),
        }
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ContentKind)> for ContentKindMap {
    fn from_iter<I: IntoIterator<Item = (K, ContentKind)>>(iter: I) -> Self {
        let mut map = ContentKindMap::new();
        for (mime, kind) in iter {
            map.insert(mime, kind);
        }
        map
    }
}

impl<'de> Deserialize<'de> for ContentKindMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, ContentKind>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_types() {
        assert_eq!(ContentKind::classify("text/event-stream"), ContentKind::Stream);
        assert_eq!(ContentKind::classify("application/octet-stream"), ContentKind::File);
        assert_eq!(ContentKind::classify("text/plain"), ContentKind::Text);
        assert_eq!(ContentKind::classify("application/problem+json"), ContentKind::Json);
    }

    #[test]
    fn test_resolve_remaps_declared_types() {
        let map: ContentKindMap = [
            ("application/x-ndjson", ContentKind::Stream),
            ("Application/PDF", ContentKind::File),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.resolve("application/x-ndjson"), "text/event-stream");
        assert_eq!(map.resolve("application/pdf"), "application/octet-stream");
        assert_eq!(map.resolve("text/html"), "text/html");
    }

    #[test]
    fn test_deserialize_from_config() {
        let map: ContentKindMap =
            serde_json::from_str(r#"{"application/vnd.report": "file", "text/csv": "text"}"#)
                .unwrap();
        assert_eq!(map.get("text/csv"), Some(ContentKind::Text));
        assert_eq!(map.get("application/vnd.report"), Some(ContentKind::File));
    }
}
