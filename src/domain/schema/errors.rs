//! Field-level validation errors and schema definition errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pseudo field name used for errors that concern the whole response
/// rather than one declared field.
pub const RESPONSE_FIELD: &str = "$response";

/// Why a single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldErrorReason {
    /// A required field is absent or null.
    Missing,
    /// The value has the wrong JSON type, even after coercion.
    TypeMismatch { expected: String, found: String },
    /// An enumeration value outside the allowed token set.
    NotAllowed { value: String, allowed: Vec<String> },
    /// An integer outside its declared bounds.
    OutOfRange {
        value: i64,
        min: Option<i64>,
        max: Option<i64>,
    },
    /// Text longer than its declared maximum (in characters).
    TooLong { max: usize, actual: usize },
    /// A list with more items than allowed.
    TooManyItems { max: usize, actual: usize },
    /// A field the schema does not declare (only under the reject policy).
    Unexpected,
    /// The response is JSON but not an object.
    NotAnObject { found: String },
    /// The response text could not be parsed as JSON.
    Unparseable { message: String },
    /// The model produced no content at all.
    EmptyOutput { required_fields: Vec<String> },
}

impl fmt::Display for FieldErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldErrorReason::Missing => write!(f, "required field is missing"),
            FieldErrorReason::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            FieldErrorReason::NotAllowed { value, allowed } => {
                write!(f, "\"{}\" is not one of: {}", value, allowed.join(", "))
            }
            FieldErrorReason::OutOfRange { value, min, max } => match (min, max) {
                (Some(min), Some(max)) => {
                    write!(f, "{} is outside the range {}..={}", value, min, max)
                }
                (Some(min), None) => write!(f, "{} is below the minimum {}", value, min),
                (None, Some(max)) => write!(f, "{} is above the maximum {}", value, max),
                (None, None) => write!(f, "{} is out of range", value),
            },
            FieldErrorReason::TooLong { max, actual } => {
                write!(f, "text has {} characters, at most {} allowed", actual, max)
            }
            FieldErrorReason::TooManyItems { max, actual } => {
                write!(f, "list has {} items, at most {} allowed", actual, max)
            }
            FieldErrorReason::Unexpected => write!(f, "field is not part of the schema"),
            FieldErrorReason::NotAnObject { found } => {
                write!(f, "response must be a JSON object, found {}", found)
            }
            FieldErrorReason::Unparseable { message } => {
                write!(f, "response is not valid JSON: {}", message)
            }
            FieldErrorReason::EmptyOutput { required_fields } => write!(
                f,
                "no content was returned; required fields: {}",
                required_fields.join(", ")
            ),
        }
    }
}

/// One field's validation failure during one attempt.
///
/// This is a value, not an exception: errors are collected per attempt
/// and carried on the extraction outcome for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field_name: String,
    pub reason: FieldErrorReason,
}

impl FieldError {
    pub fn new(field_name: impl Into<String>, reason: FieldErrorReason) -> Self {
        Self {
            field_name: field_name.into(),
            reason,
        }
    }

    /// Error for a response that had no usable content.
    pub fn empty_output(required_fields: Vec<String>) -> Self {
        Self::new(RESPONSE_FIELD, FieldErrorReason::EmptyOutput { required_fields })
    }

    /// Error for a response whose text was not JSON.
    pub fn unparseable(message: impl Into<String>) -> Self {
        Self::new(
            RESPONSE_FIELD,
            FieldErrorReason::Unparseable {
                message: message.into(),
            },
        )
    }

    /// Returns true if the error concerns the response as a whole.
    pub fn is_response_level(&self) -> bool {
        self.field_name == RESPONSE_FIELD
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_name, self.reason)
    }
}

/// Mistakes in a schema definition, caught when the schema is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaDefinitionError {
    #[error("Schema domain name cannot be empty")]
    EmptyDomain,

    #[error("Schema '{domain}' declares no fields")]
    NoFields { domain: String },

    #[error("Field name cannot be empty")]
    EmptyFieldName,

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Enumeration field '{0}' has no allowed values")]
    EmptyEnumeration(String),

    #[error("Enumeration field '{field}' lists '{value}' more than once")]
    DuplicateToken { field: String, value: String },

    #[error("Integer field '{0}' has min greater than max")]
    InvertedRange(String),

    #[error("Default for field '{field}' does not satisfy its kind: {reason}")]
    InvalidDefault { field: String, reason: String },

    #[error("Domain '{0}' is registered more than once")]
    DuplicateDomain(String),
}
