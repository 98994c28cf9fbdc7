//! Main SDK client implementation.
//!
//! Provides [`UniversalClient`], which turns routes into validated calls
//! against whatever API the registry document describes.
//!
//! # Call Flow
//!
//! ```text
//! route descriptor ─ get_sdk_path ─> route
//!                       registry refresh (hash check, maybe refetch)
//! route + SdkRequest ─ encode_request ─> EncodedRequest ─ reqwest ─> RawResponse
//!                       ResponseDecoder (spec lookup, validate, coerce)
//!                       ResponseEnvelope
//! ```
//!
//! # Examples
//!
//! ## Simple GET request
//!
//! ```ignore
//! use universal_sdk_client::{SdkRequest, UniversalClient};
//! use universal_sdk_client::client::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = UniversalClient::connect(ClientConfig::new("https://api.example.com")).await?;
//!     let envelope = client
//!         .get("/widgets/:id", SdkRequest::new().with_param("id", 1))
//!         .await?;
//!     println!("Status: {}", envelope.code);
//!     Ok(())
//! }
//! ```
//!
//! ## Calling by operation id
//!
//! ```ignore
//! let envelope = client
//!     .invoke("createWidget", SdkRequest::new().json(json!({"name": "a"})))
//!     .await?;
//! ```

use super::config::ClientConfig;
use super::decoder::{RawResponse, ResponseDecoder};
use super::encoder::encode_request;
use crate::error::{Result, SdkError};
use crate::path::{get_sdk_path, SdkPath};
use crate::registry::{RegistryCache, RegistrySnapshot};
use crate::types::{ResponseEnvelope, SdkRequest};
use http::Method;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use url::Url;

/// The main SDK client
///
/// Cheap to clone; clones share the HTTP connection pool and the registry
/// cache.
///
/// # Features
///
/// - Registry document cached by content hash
/// - Request encoding for JSON, text, binary, multipart and URL-encoded bodies
/// - Response validation against the declared schema
/// - `date-time` and `binary` fields coerced to native values
/// - Lazy server-sent event streams
#[derive(Clone, Debug)]
pub struct UniversalClient {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
    host: Url,
    registry: Arc<RegistryCache>,
}

impl UniversalClient {
    /// Create a client. Nothing is fetched until the first call.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] for an invalid host or proxy.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let host = config.host_url()?;
        let client = config.build_http_client()?;
        let registry = RegistryCache::new(client.clone(), host.clone(), config.registry.clone())
            .with_timeout(config.timeout());

        Ok(UniversalClient {
            client,
            config: Arc::new(config),
            host,
            registry: Arc::new(registry),
        })
    }

    /// Create a client and load the registry document.
    ///
    /// # Errors
    ///
    /// Fails like [`UniversalClient::with_config`], or with the registry
    /// fetch error.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::with_config(config)?;
        client.refresh().await?;
        Ok(client)
    }

    /// Make a GET request
    pub async fn get(
        &self,
        route: impl Into<SdkPath>,
        request: SdkRequest,
    ) -> Result<ResponseEnvelope> {
        self.request(Method::GET, route, request).await
    }

    /// Make a DELETE request
    pub async fn delete(
        &self,
        route: impl Into<SdkPath>,
        request: SdkRequest,
    ) -> Result<ResponseEnvelope> {
        self.request(Method::DELETE, route, request).await
    }

    /// Make a POST request
    pub async fn post(
        &self,
        route: impl Into<SdkPath>,
        request: SdkRequest,
    ) -> Result<ResponseEnvelope> {
        self.request(Method::POST, route, request).await
    }

    /// Make a PUT request
    pub async fn put(
        &self,
        route: impl Into<SdkPath>,
        request: SdkRequest,
    ) -> Result<ResponseEnvelope> {
        self.request(Method::PUT, route, request).await
    }

    /// Make a PATCH request
    pub async fn patch(
        &self,
        route: impl Into<SdkPath>,
        request: SdkRequest,
    ) -> Result<ResponseEnvelope> {
        self.request(Method::PATCH, route, request).await
    }

    /// Make a request with any method.
    ///
    /// `route` may be a literal with `:name` tokens, a pattern, or a list
    /// of alternatives (see [`get_sdk_path`]).
    ///
    /// # Errors
    ///
    /// Any [`SdkError`]: configuration problems, registry or transport
    /// failures, responses missing from the document, and payloads that fail
    /// validation or decoding.
    pub async fn request(
        &self,
        method: Method,
        route: impl Into<SdkPath>,
        request: SdkRequest,
    ) -> Result<ResponseEnvelope> {
        let route = get_sdk_path(route)?;
        let snapshot = self.refresh().await?;
        self.execute(&snapshot, method, &route, None, request).await
    }

    /// Call an operation by `operationId`, or `operationId.version` for
    /// versioned registries.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] for unknown operation keys, and
    /// otherwise fails like [`UniversalClient::request`].
    pub async fn invoke(&self, operation: &str, request: SdkRequest) -> Result<ResponseEnvelope> {
        let snapshot = self.refresh().await?;
        let target = snapshot.paths.get(operation).cloned().ok_or_else(|| {
            SdkError::Configuration(format!("unknown operation {:?}", operation))
        })?;
        let route = brace_params_to_colon(&target.path);
        let version = target.version.as_deref();
        self.execute(&snapshot, target.method, &route, version, request)
            .await
    }

    /// Run the registry refresh check and return the current snapshot.
    ///
    /// # Errors
    ///
    /// Propagates registry fetch failures.
    pub async fn refresh(&self) -> Result<Arc<RegistrySnapshot>> {
        match self.registry.refresh().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "registry refresh failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        snapshot: &RegistrySnapshot,
        method: Method,
        route: &str,
        version: Option<&str>,
        request: SdkRequest,
    ) -> Result<ResponseEnvelope> {
        let encoded = encode_request(
            &self.host,
            method.clone(),
            route,
            request,
            &self.config.default_headers,
        )?;
        let url = encoded.url.clone();

        if self.config.enable_logging {
            tracing::debug!(%method, %url, route, "sending request");
        }

        let deadline = self.config.timeout().map(|limit| Instant::now() + limit);

        let send = encoded.into_reqwest(&self.client)?.send();
        let response = within(deadline, &url, send)
            .await?
            .map_err(|e| SdkError::network(url.as_str(), e))?;
        let response = RawResponse::from_reqwest(response);

        if self.config.enable_logging {
            tracing::debug!(%method, %url, status = response.status, "received response");
        }

        // Stream bodies are handed out unread, so the deadline stops applying
        // once the event stream is returned.
        let content_kinds = &self.config.content_type_parser_map;
        let decoder = ResponseDecoder::new(&snapshot.document, content_kinds).with_version(version);
        within(deadline, &url, decoder.decode(route, &method, response)).await?
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shared registry cache.
    pub fn registry(&self) -> &RegistryCache {
        &self.registry
    }
}

async fn within<F: Future>(
    deadline: Option<Instant>,
    url: &str,
    future: F,
) -> Result<F::Output> {
    match deadline {
        Some(deadline) => timeout_at(deadline, future)
            .await
            .map_err(|_| SdkError::network(url, "request timed out")),
        None => Ok(future.await),
    }
}

/// `/widgets/{id}` becomes `/widgets/:id`, the form the encoder substitutes.
fn brace_params_to_colon(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            match segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                Some(name) if !name.is_empty() => format!(":{}", name),
                _ => segment.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = UniversalClient::with_config(ClientConfig::new("http://api.local")).unwrap();
        assert_eq!(client.config().request_timeout_ms, 30_000);
        assert!(client.registry().snapshot().is_none());
    }

    #[test]
    fn test_invalid_host_rejected() {
        let err = UniversalClient::with_config(ClientConfig::new("relative/path")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_brace_params_to_colon() {
        assert_eq!(brace_params_to_colon("/a/{id}/b/{slug}"), "/a/:id/b/:slug");
        assert_eq!(brace_params_to_colon("/plain/{}"), "/plain/{}");
    }

    #[tokio::test]
    async fn test_empty_route_fails_before_network() {
        let client = UniversalClient::with_config(ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let err = client.get("", SdkRequest::new()).await.unwrap_err();
        assert!(err.is_configuration());
    }
}
