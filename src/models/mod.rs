//! Data models for the ORM layer.
//!
//! This module re-exports the metadata types records are declared with.

pub mod field;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use field::{Field, FieldDefault, FieldKind};
pub use schema::{PLACEHOLDER, Schema, quote_ident};
pub use value::{FromValue, Row, Value};
