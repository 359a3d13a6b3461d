//! The validated analytics record handed to callers.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::FieldAccessError;
use crate::domain::schema::{FieldError, FieldValue, Schema};

/// One validated instance of a schema.
///
/// Only the repair loop creates records, and only from a candidate that
/// passed validation, so every required field is present and every value
/// satisfies its kind. Records are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    domain: String,
    /// Every declared field; `None` for absent optional fields.
    values: BTreeMap<String, Option<FieldValue>>,
}

impl ResultRecord {
    pub(crate) fn new(
        domain: impl Into<String>,
        values: BTreeMap<String, Option<FieldValue>>,
    ) -> Self {
        Self {
            domain: domain.into(),
            values,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Value of a field, or `None` if it is absent or undeclared.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    /// Value of a field that the caller expects to be present.
    pub fn require(&self, name: &str) -> Result<&FieldValue, FieldAccessError> {
        match self.values.get(name) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(FieldAccessError::NotPresent(name.to_string())),
            None => Err(FieldAccessError::NotInSchema {
                field: name.to_string(),
                domain: self.domain.clone(),
            }),
        }
    }

    pub fn require_bool(&self, name: &str) -> Result<bool, FieldAccessError> {
        self.require(name)?
            .as_bool()
            .ok_or_else(|| wrong_kind(name, "boolean"))
    }

    /// Text or enumeration token.
    pub fn require_str(&self, name: &str) -> Result<&str, FieldAccessError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| wrong_kind(name, "string"))
    }

    pub fn require_i64(&self, name: &str) -> Result<i64, FieldAccessError> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| wrong_kind(name, "integer"))
    }

    pub fn str_list(&self, name: &str) -> Result<&[String], FieldAccessError> {
        self.require(name)?
            .as_list()
            .ok_or_else(|| wrong_kind(name, "list of strings"))
    }

    /// Declared field names, sorted.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The record as a JSON object; absent optional fields are `null`.
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| {
                let json = value.as_ref().map(FieldValue::to_json).unwrap_or(Value::Null);
                (name.clone(), json)
            })
            .collect();
        Value::Object(object)
    }

    /// Re-checks the serialized record against a schema.
    ///
    /// A record built by the repair loop always comes back clean.
    pub fn revalidate(&self, schema: &Schema) -> Vec<FieldError> {
        schema.validate(&self.to_json())
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn wrong_kind(field: &str, expected: &'static str) -> FieldAccessError {
    FieldAccessError::WrongKind {
        field: field.to_string(),
        expected,
    }
}
