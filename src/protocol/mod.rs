//! Protocol constants, header parsing and content negotiation.
//!
//! - **constants** - MIME types, header names, registry hash conventions
//! - **headers** - `Content-Type` and `Content-Disposition` parsing
//! - **content_kind** - payload kinds and the caller's MIME override map

pub mod constants;
mod content_kind;
mod headers;

pub use content_kind::{ContentKind, ContentKindMap};
pub use headers::{
    attachment_filename, content_type, parse_content_disposition_filename, parse_media_type,
};
