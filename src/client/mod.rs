//! Universal SDK client implementation.
//!
//! This module provides a spec-driven HTTP client, enabling callers to:
//!
//! - **Call any route** the registry's OpenAPI document describes
//! - **Encode request bodies** as JSON, text, binary, multipart or URL-encoded forms
//! - **Validate responses** against the schema declared for the route and status
//! - **Consume server-sent events** as a lazy, validated stream
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch   - UniversalClient and the call flow
//! ├── encoder - Request encoding (params, query, bodies, headers)
//! ├── decoder - Response decoding by content kind
//! ├── parser  - Incremental event-stream parser
//! ├── stream  - Lazy validated event stream
//! ├── config  - Client configuration
//! └── utils   - Value stringification and URI encoding
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`UniversalClient`] | Main client with the five HTTP verbs and `invoke` |
//! | [`ClientConfig`] | Client configuration options |
//! | [`EncodedRequest`] | Transport-ready request |
//! | [`ResponseDecoder`] | Spec lookup, validation and decoding |
//! | [`SseParser`] | Streaming event parser |
//! | [`EventStream`] | Lazy sequence of validated events |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use universal_sdk_client::client::{ClientConfig, UniversalClient};
//! use universal_sdk_client::registry::RegistryOptions;
//!
//! // Default configuration
//! let client = UniversalClient::with_config(ClientConfig::new("https://api.example.com")).unwrap();
//!
//! // Custom configuration
//! let config = ClientConfig {
//!     request_timeout_ms: 5_000,
//!     enable_logging: true,
//!     ..ClientConfig::new("https://api.example.com")
//! }
//! .with_registry(RegistryOptions::url("https://registry.example.com/openapi").pinned());
//! let client = UniversalClient::with_config(config).unwrap();
//! ```
//!
//! ## Parsing Events
//!
//! ```
//! use universal_sdk_client::client::{ParseState, SseParser};
//!
//! let mut parser = SseParser::new();
//! assert_eq!(parser.state(), ParseState::AwaitingLine);
//!
//! // Feed data incrementally
//! let events = parser.feed(b"id: 1\ndata: {\"n\": 1}\n\n");
//! assert_eq!(events.len(), 1);
//! ```

mod config;
mod decoder;
mod encoder;
mod fetch;
mod parser;
mod stream;
mod utils;

pub use config::ClientConfig;
pub use decoder::{RawResponse, ResponseDecoder};
pub use encoder::{
    encode_request, serialize_query, substitute_path_params, EncodedBody, EncodedRequest,
    MultipartPart, PartValue,
};
pub use fetch::UniversalClient;
pub use parser::{ParseState, RawEvent, SseParser};
pub use stream::{ByteStream, EventStream};
pub use utils::*;
