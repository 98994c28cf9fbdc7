//! Error types for the universal SDK client.
//!
//! Every failure surfaces as an [`SdkError`]. Nothing is retried internally;
//! callers decide on retry and classification using the `is_*` helpers.
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | [`SdkError::Configuration`] | client used before initialization, empty path, bad request descriptor |
//! | [`SdkError::Network`] | non-OK registry fetch or any transport failure |
//! | [`SdkError::SpecCoverage`] | route/method/status missing from the cached document |
//! | [`SdkError::Validation`] | JSON response or SSE event fails its schema |
//! | [`SdkError::Decode`] | malformed base64 under a `binary` field, unparsable event data |

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors produced by the universal SDK client.
#[derive(Error, Debug)]
pub enum SdkError {
    /// The client or a request was configured incorrectly.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport failure or a non-OK status while talking to the registry.
    #[error("Network error for {url}: {message}")]
    Network {
        /// Target URL of the failed request
        url: String,
        /// HTTP status, if the server answered at all
        status: Option<u16>,
        /// Human readable detail
        message: String,
    },

    /// The cached OpenAPI document does not describe this response.
    #[error("No response declared for {method} {route} with status {status}")]
    SpecCoverage {
        /// Route template used for the lookup
        route: String,
        /// Lowercase HTTP method
        method: String,
        /// Response status code
        status: u16,
    },

    /// A response payload did not match its declared schema.
    #[error("Validation failed for {context}: {}", errors.join("; "))]
    Validation {
        /// Which response (or stream event) was being validated
        context: String,
        /// Messages reported by the validator
        errors: Vec<String>,
    },

    /// A payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SdkError {
    pub(crate) fn network(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        SdkError::Network {
            url: url.into(),
            status: None,
            message: err.to_string(),
        }
    }

    pub(crate) fn status(url: impl Into<String>, status: u16) -> Self {
        SdkError::Network {
            url: url.into(),
            status: Some(status),
            message: format!("unexpected status {}", status),
        }
    }

    /// Whether this is a transport or registry fetch failure.
    pub fn is_network(&self) -> bool {
        matches!(self, SdkError::Network { .. })
    }

    /// Whether a payload failed schema validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, SdkError::Validation { .. })
    }

    /// Whether the response was not covered by the OpenAPI document.
    pub fn is_spec_coverage(&self) -> bool {
        matches!(self, SdkError::SpecCoverage { .. })
    }

    /// Whether the client or request was misconfigured.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SdkError::Configuration(_) | SdkError::Url(_))
    }

    /// Whether a payload could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, SdkError::Decode(_) | SdkError::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_is_network() {
        let err = SdkError::status("http://localhost/openapi-hash", 503);
        assert!(err.is_network());
        match err {
            SdkError::Network { status, .. } => assert_eq!(status, Some(503)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_display_joins_messages() {
        let err = SdkError::Validation {
            context: "GET /widgets 200".into(),
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "Validation failed for GET /widgets 200: a; b");
    }
}
