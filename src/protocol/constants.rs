//! Protocol constants: MIME types, header names and registry conventions.

/// MIME types the decoder dispatches on.
pub mod media_types {
    /// Structured payloads, the default when no `Content-Type` is present
    pub const APPLICATION_JSON: &str = "application/json";
    /// Binary downloads and file uploads
    pub const OCTET_STREAM: &str = "application/octet-stream";
    /// Server-sent events
    pub const EVENT_STREAM: &str = "text/event-stream";
    /// Plain text
    pub const TEXT_PLAIN: &str = "text/plain";
    /// Multipart forms
    pub const MULTIPART_FORM: &str = "multipart/form-data";
    /// URL-encoded forms
    pub const URL_ENCODED_FORM: &str = "application/x-www-form-urlencoded";
}

/// Header names, lowercase.
pub mod headers {
    use http::header::HeaderName;

    /// `content-type`
    pub const CONTENT_TYPE: HeaderName = http::header::CONTENT_TYPE;
    /// `content-disposition`
    pub const CONTENT_DISPOSITION: HeaderName = http::header::CONTENT_DISPOSITION;
}

/// Suffix appended to the registry URL to fetch its content hash.
pub const HASH_SUFFIX: &str = "-hash";

/// Hash value marking a registry snapshot that is never refreshed.
pub const STATIC_HASH: &str = "static";
