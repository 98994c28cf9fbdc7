//! Hash-based caching of the registry document.
//!
//! # Refresh Protocol
//!
//! ```text
//! previous hash == static, or raw document cached  -> unchanged, no I/O
//! raw document, first call                         -> raw document, hash = static
//! static flag, first call                          -> GET {registry}, hash = static
//! otherwise                                        -> GET {registry}-hash
//!     hash == previous                             -> unchanged
//!     hash != previous (or no previous)            -> GET {registry}, new hash
//! ```
//!
//! Any non-2xx answer from the registry is a [`SdkError::Network`].
//!
//! Refreshes are not de-duplicated: concurrent callers each run their own
//! fetch and the last snapshot written wins. Snapshots are immutable and
//! swapped whole, so readers never observe a half-updated cache.

use super::document::{OpenApiDocument, SdkPathMap};
use crate::client::join_host;
use crate::error::{Result, SdkError};
use crate::protocol::constants::{HASH_SUFFIX, STATIC_HASH};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Where the registry document comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrySource {
    /// Path relative to the client's host
    Path(String),
    /// Absolute registry URL
    Url(String),
    /// An already-resolved document, never fetched
    Raw(JsonValue),
}

/// Registry options given at client construction.
///
/// ```
/// use universal_sdk_client::registry::{RegistryOptions, RegistrySource};
///
/// let options: RegistryOptions =
///     serde_json::from_str(r#"{"path": "/openapi", "static": true}"#).unwrap();
/// assert_eq!(options.source, RegistrySource::Path("/openapi".into()));
/// assert!(options.is_static);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryOptions {
    /// Document source
    #[serde(flatten)]
    pub source: RegistrySource,
    /// Cache the first document forever
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl RegistryOptions {
    /// Fetch from a path on the client's host.
    pub fn path(path: impl Into<String>) -> Self {
        Self::from(RegistrySource::Path(path.into()))
    }

    /// Fetch from an absolute URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self::from(RegistrySource::Url(url.into()))
    }

    /// Use an in-memory document.
    pub fn raw(document: JsonValue) -> Self {
        Self::from(RegistrySource::Raw(document))
    }

    /// Pin the first fetched document.
    pub fn pinned(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Absolute registry URL, or `None` for raw documents.
    ///
    /// Paths are appended to the host, base path included, the same way
    /// request routes are.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Url`] if the path or URL does not parse.
    pub fn registry_url(&self, host: &Url) -> Result<Option<Url>> {
        match &self.source {
            RegistrySource::Path(path) => Ok(Some(Url::parse(&join_host(host, path))?)),
            RegistrySource::Url(url) => Ok(Some(Url::parse(url)?)),
            RegistrySource::Raw(_) => Ok(None),
        }
    }
}

impl From<RegistrySource> for RegistryOptions {
    fn from(source: RegistrySource) -> Self {
        RegistryOptions {
            source,
            is_static: false,
        }
    }
}

impl Default for RegistryOptions {
    fn default() -> Self {
        RegistryOptions::path("/openapi")
    }
}

/// Content hash of a cached document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryHash {
    /// Never refreshed again
    Static,
    /// Hash text served by `{registry}-hash`
    Digest(String),
}

impl fmt::Display for RegistryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryHash::Static => f.write_str(STATIC_HASH),
            RegistryHash::Digest(d) => f.write_str(d),
        }
    }
}

/// Outcome of one refresh check.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryUpdate {
    /// Keep the cached snapshot
    Unchanged,
    /// Replace the cached snapshot
    Updated {
        /// Freshly fetched document
        document: OpenApiDocument,
        /// Its hash
        hash: RegistryHash,
    },
}

impl RegistryUpdate {
    /// Whether the cache must be replaced.
    pub fn update_required(&self) -> bool {
        matches!(self, RegistryUpdate::Updated { .. })
    }
}

/// Decide whether the registry must be refetched and fetch it if so.
///
/// # Errors
///
/// Returns [`SdkError::Network`] on transport failures and non-2xx answers,
/// and [`SdkError::Json`] if the document is not JSON.
pub async fn fetch_registry(
    http: &reqwest::Client,
    host: &Url,
    options: &RegistryOptions,
    previous: Option<&RegistryHash>,
) -> Result<RegistryUpdate> {
    if previous == Some(&RegistryHash::Static) {
        return Ok(RegistryUpdate::Unchanged);
    }

    let registry = match options.registry_url(host)? {
        Some(url) => url,
        None => {
            let RegistrySource::Raw(document) = &options.source else {
                return Ok(RegistryUpdate::Unchanged);
            };
            if previous.is_some() {
                return Ok(RegistryUpdate::Unchanged);
            }
            return Ok(RegistryUpdate::Updated {
                document: OpenApiDocument::new(document.clone()),
                hash: RegistryHash::Static,
            });
        }
    };

    if options.is_static {
        if previous.is_some() {
            return Ok(RegistryUpdate::Unchanged);
        }
        let document = fetch_document(http, &registry).await?;
        tracing::debug!(registry = %registry, "pinned static registry document");
        return Ok(RegistryUpdate::Updated {
            document,
            hash: RegistryHash::Static,
        });
    }

    let hash_url = format!("{}{}", registry, HASH_SUFFIX);
    let response = http
        .get(&hash_url)
        .send()
        .await
        .map_err(|e| SdkError::network(&hash_url, e))?;
    if !response.status().is_success() {
        return Err(SdkError::status(&hash_url, response.status().as_u16()));
    }
    let hash = response
        .text()
        .await
        .map_err(|e| SdkError::network(&hash_url, e))?
        .trim()
        .to_string();

    if let Some(RegistryHash::Digest(previous)) = previous {
        if *previous == hash {
            tracing::debug!(registry = %registry, %hash, "registry hash unchanged");
            return Ok(RegistryUpdate::Unchanged);
        }
    }

    let document = fetch_document(http, &registry).await?;
    tracing::debug!(registry = %registry, %hash, "registry document refreshed");
    Ok(RegistryUpdate::Updated {
        document,
        hash: RegistryHash::Digest(hash),
    })
}

async fn fetch_document(http: &reqwest::Client, registry: &Url) -> Result<OpenApiDocument> {
    let response = http
        .get(registry.clone())
        .send()
        .await
        .map_err(|e| SdkError::network(registry.as_str(), e))?;
    if !response.status().is_success() {
        return Err(SdkError::status(registry.as_str(), response.status().as_u16()));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| SdkError::network(registry.as_str(), e))?;
    Ok(OpenApiDocument::new(serde_json::from_slice(&body)?))
}

/// One immutable view of the registry.
#[derive(Debug)]
pub struct RegistrySnapshot {
    /// The cached document
    pub document: OpenApiDocument,
    /// Its hash
    pub hash: RegistryHash,
    /// Operation index derived from `document`
    pub paths: SdkPathMap,
}

impl RegistrySnapshot {
    /// Index `document` and bundle it with its hash.
    pub fn new(document: OpenApiDocument, hash: RegistryHash) -> Self {
        let paths = document.path_map();
        RegistrySnapshot {
            document,
            hash,
            paths,
        }
    }
}

/// Per-client registry cache.
pub struct RegistryCache {
    http: reqwest::Client,
    host: Url,
    options: RegistryOptions,
    /// Bound on one whole refresh check, hash and document included
    timeout: Option<Duration>,
    snapshot: RwLock<Option<Arc<RegistrySnapshot>>>,
}

impl RegistryCache {
    /// An empty cache; nothing is fetched until [`RegistryCache::refresh`].
    pub fn new(http: reqwest::Client, host: Url, options: RegistryOptions) -> Self {
        RegistryCache {
            http,
            host,
            options,
            timeout: None,
            snapshot: RwLock::new(None),
        }
    }

    /// Fail refresh checks that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The current snapshot, if any refresh has succeeded.
    pub fn snapshot(&self) -> Option<Arc<RegistrySnapshot>> {
        self.snapshot.read().clone()
    }

    /// The current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] before the first successful refresh.
    pub fn current(&self) -> Result<Arc<RegistrySnapshot>> {
        self.snapshot().ok_or_else(|| {
            SdkError::Configuration("SDK used before the registry was initialized".into())
        })
    }

    /// Hash of the current snapshot.
    pub fn hash(&self) -> Option<RegistryHash> {
        self.snapshot.read().as_ref().map(|s| s.hash.clone())
    }

    /// Registry options this cache was built with.
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Run one refresh check and return the snapshot to use.
    ///
    /// # Errors
    ///
    /// Propagates [`fetch_registry`] failures unchanged.
    pub async fn refresh(&self) -> Result<Arc<RegistrySnapshot>> {
        let previous = self.hash();
        let check = fetch_registry(&self.http, &self.host, &self.options, previous.as_ref());
        let update = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, check).await.map_err(|_| {
                SdkError::network(self.host.as_str(), "registry refresh timed out")
            })??,
            None => check.await?,
        };

        match update {
            RegistryUpdate::Updated { document, hash } => {
                let snapshot = Arc::new(RegistrySnapshot::new(document, hash));
                *self.snapshot.write() = Some(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            RegistryUpdate::Unchanged => self.current(),
        }
    }
}

impl fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCache")
            .field("host", &self.host.as_str())
            .field("options", &self.options)
            .field("hash", &self.hash())
            .finish()
    }
}
