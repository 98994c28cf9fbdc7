#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Universal SDK Client
//!
//! A spec-driven HTTP client. Instead of generating code per API, the client
//! fetches the API's OpenAPI document at runtime and uses it to decode and
//! validate every response.
//!
//! ## Overview
//!
//! Five pieces cooperate on each call:
//!
//! 1. **PathResolver** ([`path`]) - turns a literal, pattern or list of
//!    alternatives into one concrete route
//! 2. **RegistryCache** ([`registry`]) - keeps the OpenAPI document fresh by
//!    polling a cheap content hash
//! 3. **RequestEncoder** ([`client::encode_request`]) - substitutes path
//!    parameters, serializes the query and encodes the body
//! 4. **ResponseDecoder** ([`client::ResponseDecoder`]) - finds the declared
//!    response, validates it and decodes it by content kind
//! 5. **TypeCoercer** ([`schema::coerce_special_types`]) - turns `date-time`
//!    and `binary` strings into native values
//!
//! ## Key Features
//!
//! - **Hash-based cache invalidation**: the document is refetched only when
//!   `{registry}-hash` changes, or never for static registries
//! - **Content negotiation**: JSON, text, binary files and server-sent events,
//!   with caller overrides for exotic MIME types
//! - **Schema validation**: scalars are coerced toward their declared type, then
//!   validated; failures carry every validator message
//! - **Lazy event streams**: events are pulled, validated and coerced one at a
//!   time, and the reader is released on close or drop
//! - **Operation ids**: `invoke("createWidget", ..)` dispatches by `operationId`
//!
//! ## Client Usage
//!
//! ```ignore
//! use universal_sdk_client::{SdkRequest, UniversalClient};
//! use universal_sdk_client::client::ClientConfig;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = UniversalClient::connect(ClientConfig::new("http://localhost:3000")).await?;
//!
//!     let created = client
//!         .post("/widgets", SdkRequest::new().json(json!({"name": "a"})))
//!         .await?;
//!     let widget = created.response.as_json().unwrap();
//!     println!("created at {:?}", widget.get("createdAt").and_then(|v| v.as_datetime()));
//!
//!     let mut events = client
//!         .get("/widgets/events", SdkRequest::new())
//!         .await?
//!         .response
//!         .into_stream()
//!         .unwrap();
//!     while let Some(event) = events.next().await {
//!         println!("{:?}", event?.data);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Values, blobs, request descriptors and the response envelope
//! - **[error]** - Error types and result handling
//! - **[client]** - The client, request encoding, response decoding, event streams
//! - **[registry]** - Registry fetching, hash cache and document lookups
//! - **[schema]** - Validation and type coercion
//! - **[path]** - Route descriptor resolution
//! - **[protocol]** - MIME constants, content kinds and header parsing

pub mod client;
pub mod error;
pub mod path;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod types;

pub use client::{ClientConfig, EventStream, UniversalClient};
pub use error::{Result, SdkError};
pub use path::{get_sdk_path, SdkPath};
pub use registry::{RegistryOptions, RegistrySource};
pub use schema::coerce_special_types;
pub use types::{
    Blob, FormValue, NamedFile, RequestBody, ResponseEnvelope, ResponsePayload, SdkRequest,
    SseEvent, Value,
};
