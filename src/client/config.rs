//! Client configuration.

use crate::error::{Result, SdkError};
use crate::protocol::ContentKindMap;
use crate::registry::RegistryOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Configuration for [`UniversalClient`](super::UniversalClient).
///
/// ```
/// use universal_sdk_client::client::ClientConfig;
///
/// let config = ClientConfig::from_json(r#"{
///     "host": "https://api.example.com",
///     "registry": {"path": "/openapi", "static": true},
///     "contentTypeParserMap": {"application/vnd.ndjson": "text"}
/// }"#).unwrap();
/// assert!(config.registry.is_static);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Base URL every route is joined onto
    pub host: String,
    /// Where the OpenAPI document comes from
    pub registry: RegistryOptions,
    /// Per-request timeout in milliseconds (0 disables it)
    pub request_timeout_ms: u64,
    /// Proxy for all traffic (empty for none)
    pub proxy_url: String,
    /// Log every outbound request and decode decision
    pub enable_logging: bool,
    /// MIME type → content kind overrides
    pub content_type_parser_map: ContentKindMap,
    /// Headers sent on every call; request headers win
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "http://localhost".to_string(),
            registry: RegistryOptions::default(),
            request_timeout_ms: 30_000,
            proxy_url: String::new(),
            enable_logging: false,
            content_type_parser_map: ContentKindMap::new(),
            default_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Config for `host` with everything else defaulted.
    pub fn new(host: impl Into<String>) -> Self {
        ClientConfig {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Json`] if the document does not parse.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Replace the registry options.
    pub fn with_registry(mut self, registry: RegistryOptions) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the content kind overrides.
    pub fn with_content_kinds(mut self, map: ContentKindMap) -> Self {
        self.content_type_parser_map = map;
        self
    }

    /// Add a header sent on every call.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Turn request logging on or off.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Parsed [`ClientConfig::host`].
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] if the host is not an absolute URL.
    pub fn host_url(&self) -> Result<Url> {
        Url::parse(&self.host)
            .map_err(|e| SdkError::Configuration(format!("invalid host {:?}: {}", self.host, e)))
    }

    /// Request timeout, if any.
    ///
    /// Bounds connecting, waiting for response headers and reading bodies
    /// that are decoded eagerly. Event streams are never cut off by it.
    pub fn timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    /// Build the reqwest client described by this config.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] for an unusable proxy URL or TLS setup.
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().pool_idle_timeout(Duration::from_secs(90));

        // A client-wide `timeout` would also cover streamed bodies.
        if let Some(timeout) = self.timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if !self.proxy_url.is_empty() {
            let proxy = reqwest::Proxy::all(&self.proxy_url)
                .map_err(|e| SdkError::Configuration(format!("invalid proxy url: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| SdkError::Configuration(format!("failed to build HTTP client: {}", e)))
    }
}
