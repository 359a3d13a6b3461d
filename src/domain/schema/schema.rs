//! Ordered schema definition and candidate validation.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use super::{json_type_name, FieldError, FieldErrorReason, FieldSpec, FieldValue, SchemaDefinitionError, RESPONSE_FIELD};

/// What to do with fields in model output that the schema does not declare.
///
/// They are never merged into a record; the only question is whether their
/// presence fails the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Drop them silently (callers may log the names).
    #[default]
    Ignore,
    /// Report each one as an `Unexpected` field error.
    Reject,
}

/// Values of a candidate that passed validation, keyed by field name.
///
/// Every declared field has an entry; `None` marks an optional field that
/// was absent and has no default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformedValues {
    pub values: BTreeMap<String, Option<FieldValue>>,
    /// Undeclared fields that were dropped under [`UnknownFieldPolicy::Ignore`].
    pub ignored_fields: Vec<String>,
}

/// The closed, ordered set of fields for one analytics domain.
///
/// Schemas are built once and never mutated; share them as `Arc<Schema>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    domain: String,
    title: Option<String>,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Starts a schema definition for the given domain.
    pub fn builder(domain: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            domain: domain.into(),
            title: None,
            fields: Vec::new(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Names of required fields, in declaration order.
    pub fn required_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.is_required())
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Validates a candidate, ignoring undeclared fields.
    ///
    /// Returns every violation in one pass, in schema order; an empty list
    /// means the candidate conforms.
    pub fn validate(&self, candidate: &Value) -> Vec<FieldError> {
        self.validate_with(candidate, UnknownFieldPolicy::Ignore)
    }

    /// Validates a candidate under an explicit unknown-field policy.
    pub fn validate_with(&self, candidate: &Value, policy: UnknownFieldPolicy) -> Vec<FieldError> {
        match self.conform(candidate, policy) {
            Ok(_) => Vec::new(),
            Err(errors) => errors,
        }
    }

    /// Validates a candidate and, if it conforms, returns its typed values.
    ///
    /// Validation is all-or-nothing: either every declared field checks out
    /// or the full list of errors is returned.
    pub fn conform(
        &self,
        candidate: &Value,
        policy: UnknownFieldPolicy,
    ) -> Result<ConformedValues, Vec<FieldError>> {
        let Some(object) = candidate.as_object() else {
            return Err(vec![FieldError::new(
                RESPONSE_FIELD,
                FieldErrorReason::NotAnObject {
                    found: json_type_name(candidate).to_string(),
                },
            )]);
        };

        let mut errors = Vec::new();
        let mut values = BTreeMap::new();

        for spec in &self.fields {
            match object.get(spec.name()) {
                None | Some(Value::Null) => {
                    if spec.is_required() {
                        errors.push(FieldError::new(spec.name(), FieldErrorReason::Missing));
                    } else {
                        values.insert(spec.name().to_string(), spec.default_value().cloned());
                    }
                }
                Some(value) => match spec.check(value) {
                    Ok(checked) => {
                        values.insert(spec.name().to_string(), Some(checked));
                    }
                    Err(reason) => errors.push(FieldError::new(spec.name(), reason)),
                },
            }
        }

        let unknown: Vec<String> = object
            .keys()
            .filter(|key| self.field(key).is_none())
            .cloned()
            .collect();

        let ignored_fields = match policy {
            UnknownFieldPolicy::Ignore => unknown,
            UnknownFieldPolicy::Reject => {
                errors.extend(
                    unknown
                        .into_iter()
                        .map(|name| FieldError::new(name, FieldErrorReason::Unexpected)),
                );
                Vec::new()
            }
        };

        if errors.is_empty() {
            Ok(ConformedValues {
                values,
                ignored_fields,
            })
        } else {
            Err(errors)
        }
    }
}

/// Collects field specifications and checks the definition on `build`.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    domain: String,
    title: Option<String>,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    /// Sets a human-readable title for instructions.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaDefinitionError> {
        if self.domain.trim().is_empty() {
            return Err(SchemaDefinitionError::EmptyDomain);
        }
        if self.fields.is_empty() {
            return Err(SchemaDefinitionError::NoFields {
                domain: self.domain,
            });
        }

        {
            let mut seen = HashSet::new();
            for spec in &self.fields {
                spec.check_definition()?;
                if !seen.insert(spec.name()) {
                    return Err(SchemaDefinitionError::DuplicateField(spec.name().to_string()));
                }
            }
        }

        Ok(Schema {
            domain: self.domain,
            title: self.title,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn triage_schema() -> Schema {
        Schema::builder("triage")
            .field(FieldSpec::enumeration("request_type", ["incident", "service_request"]))
            .field(FieldSpec::boolean("first_call_resolution"))
            .field(FieldSpec::text("ticket_number").optional())
            .field(FieldSpec::string_list("keywords").with_default(FieldValue::List(vec![])))
            .build()
            .unwrap()
    }

    #[test]
    fn valid_candidate_has_no_errors() {
        let errors = triage_schema().validate(&json!({
            "request_type": "incident",
            "first_call_resolution": true
        }));
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn reports_every_missing_required_field_at_once() {
        let errors = triage_schema().validate(&json!({}));
        let names: Vec<&str> = errors.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, vec!["request_type", "first_call_resolution"]);
        assert!(errors.iter().all(|e| e.reason == FieldErrorReason::Missing));
    }

    #[test]
    fn collects_mixed_errors_in_schema_order() {
        let errors = triage_schema().validate(&json!({
            "request_type": "bug",
            "first_call_resolution": "maybe",
            "ticket_number": 12
        }));
        let names: Vec<&str> = errors.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, vec!["request_type", "first_call_resolution", "ticket_number"]);
    }

    #[test]
    fn null_required_field_counts_as_missing() {
        let errors = triage_schema().validate(&json!({
            "request_type": null,
            "first_call_resolution": false
        }));
        assert_eq!(errors, vec![FieldError::new("request_type", FieldErrorReason::Missing)]);
    }

    #[test]
    fn non_object_candidate_is_a_single_response_error() {
        let errors = triage_schema().validate(&json!(["incident"]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_response_level());
        assert_eq!(
            errors[0].reason,
            FieldErrorReason::NotAnObject {
                found: "array".to_string()
            }
        );
    }

    #[test]
    fn conform_fills_defaults_and_marks_absent_optionals() {
        let conformed = triage_schema()
            .conform(
                &json!({"request_type": "service_request", "first_call_resolution": "true"}),
                UnknownFieldPolicy::Ignore,
            )
            .unwrap();
        assert_eq!(conformed.values["ticket_number"], None);
        assert_eq!(conformed.values["keywords"], Some(FieldValue::List(vec![])));
        assert_eq!(
            conformed.values["first_call_resolution"],
            Some(FieldValue::Boolean(true))
        );
    }

    #[test]
    fn unknown_fields_are_dropped_under_ignore() {
        let conformed = triage_schema()
            .conform(
                &json!({"request_type": "incident", "first_call_resolution": true, "mood": "sunny"}),
                UnknownFieldPolicy::Ignore,
            )
            .unwrap();
        assert!(!conformed.values.contains_key("mood"));
        assert_eq!(conformed.ignored_fields, vec!["mood".to_string()]);
    }

    #[test]
    fn unknown_fields_fail_under_reject() {
        let errors = triage_schema().validate_with(
            &json!({"request_type": "incident", "first_call_resolution": true, "mood": "sunny"}),
            UnknownFieldPolicy::Reject,
        );
        assert_eq!(errors, vec![FieldError::new("mood", FieldErrorReason::Unexpected)]);
    }

    #[test]
    fn builder_rejects_duplicate_fields() {
        let result = Schema::builder("dup")
            .field(FieldSpec::boolean("flag"))
            .field(FieldSpec::text("flag"))
            .build();
        assert_eq!(result, Err(SchemaDefinitionError::DuplicateField("flag".to_string())));
    }

    #[test]
    fn builder_rejects_empty_schema() {
        assert!(matches!(
            Schema::builder("empty").build(),
            Err(SchemaDefinitionError::NoFields { .. })
        ));
        assert_eq!(
            Schema::builder(" ").field(FieldSpec::boolean("a")).build(),
            Err(SchemaDefinitionError::EmptyDomain)
        );
    }

    #[test]
    fn required_fields_follow_declaration_order() {
        assert_eq!(
            triage_schema().required_fields(),
            vec!["request_type".to_string(), "first_call_resolution".to_string()]
        );
    }
}
