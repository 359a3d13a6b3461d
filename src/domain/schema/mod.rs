//! Schema module - the closed, typed shape an analytics record must take.
//!
//! A [`Schema`] is an inspectable list of [`FieldSpec`]s rather than a set of
//! Rust types, because model output is loosely typed JSON and every field has
//! to be checked explicitly before a record is built.
//!
//! - [`FieldSpec`] / [`FieldKind`] - one field's name, kind, constraints and default
//! - [`Schema`] - ordered fields for one analytics domain, plus validation
//! - [`SchemaRegistry`] - read-only lookup of schemas by domain
//! - [`helpdesk`] - the built-in IT helpdesk conversation analytics schema

mod errors;
mod field;
pub mod helpdesk;
mod instruction;
mod registry;
mod schema;
mod value;

pub use errors::{FieldError, FieldErrorReason, SchemaDefinitionError, RESPONSE_FIELD};
pub use field::{FieldKind, FieldSpec};
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use schema::{ConformedValues, Schema, SchemaBuilder, UnknownFieldPolicy};
pub use value::{json_type_name, FieldValue};
