//! The OpenAPI registry: fetching, hash-based caching, and lookups.
//!
//! # Module Organization
//!
//! ```text
//! registry/
//! ├── cache    - RegistryCache and the hash refresh protocol
//! └── document - OpenApiDocument, response lookup, operation index
//! ```

mod cache;
mod document;

pub use cache::{
    fetch_registry, RegistryCache, RegistryHash, RegistryOptions, RegistrySnapshot,
    RegistrySource, RegistryUpdate,
};
pub use document::{dereference, OpenApiDocument, ResponseSpec, SdkOperation, SdkPathMap};
