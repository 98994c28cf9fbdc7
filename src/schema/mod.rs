//! Schema-driven validation and coercion of response payloads.
//!
//! - **validate** - scalar coercion plus JSON-Schema validation of raw JSON
//! - **coerce** - `date-time` / `binary` string coercion on decoded [`Value`](crate::Value)s

mod coerce;
mod validate;

pub use coerce::coerce_special_types;
pub use validate::{coerce_scalar_types, SchemaValidator};
