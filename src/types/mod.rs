//! Core data types shared by the encoder, decoder and client.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SdkRequest`] | params, query, headers and body for one call |
//! | [`RequestBody`] | one of six body shapes |
//! | [`ResponseEnvelope`] | `{code, response, headers}` |
//! | [`Value`] | decoded payload tree with date and binary leaves |
//! | [`Blob`] / [`NamedFile`] | binary payloads |

mod blob;
mod request;
mod response;
mod value;

pub use blob::{Blob, NamedFile};
pub use request::{FormValue, RequestBody, SdkRequest};
pub use response::{ResponseEnvelope, ResponsePayload, SseEvent};
pub use value::Value;
