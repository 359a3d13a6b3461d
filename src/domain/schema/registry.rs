//! Read-only lookup of schemas by analytics domain.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{helpdesk, FieldError, Schema, SchemaDefinitionError};

/// Maps domain names to immutable schemas.
///
/// Built once and then only read, so it can be shared across tasks
/// behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Registry holding the built-in domains.
    pub fn with_builtin() -> Result<Self, SchemaDefinitionError> {
        Ok(Self::builder().register(helpdesk::schema()?)?.build())
    }

    pub fn schema(&self, domain: &str) -> Option<Arc<Schema>> {
        self.schemas.get(domain).cloned()
    }

    pub fn instruction(&self, domain: &str) -> Option<String> {
        self.schemas.get(domain).map(|s| s.instruction())
    }

    /// Validates a candidate against a domain's schema.
    ///
    /// Returns `None` if the domain is unknown.
    pub fn validate(&self, domain: &str, candidate: &Value) -> Option<Vec<FieldError>> {
        self.schemas.get(domain).map(|s| s.validate(candidate))
    }

    /// Registered domain names, sorted.
    pub fn domains(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.schemas.contains_key(domain)
    }
}

#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistryBuilder {
    /// Adds a schema under its own domain name.
    pub fn register(mut self, schema: Schema) -> Result<Self, SchemaDefinitionError> {
        let domain = schema.domain().to_string();
        if self.schemas.contains_key(&domain) {
            return Err(SchemaDefinitionError::DuplicateDomain(domain));
        }
        self.schemas.insert(domain, Arc::new(schema));
        Ok(self)
    }

    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            schemas: self.schemas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::FieldSpec;
    use serde_json::json;

    fn triage() -> Schema {
        Schema::builder("triage")
            .field(FieldSpec::enumeration("request_type", ["incident", "service_request"]))
            .field(FieldSpec::boolean("first_call_resolution"))
            .build()
            .unwrap()
    }

    #[test]
    fn lookup_returns_shared_schema() {
        let registry = SchemaRegistry::builder().register(triage()).unwrap().build();
        let a = registry.schema("triage").unwrap();
        let b = registry.schema("triage").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.schema("billing").is_none());
    }

    #[test]
    fn duplicate_domain_is_rejected() {
        let result = SchemaRegistry::builder()
            .register(triage())
            .unwrap()
            .register(triage());
        assert!(matches!(result, Err(SchemaDefinitionError::DuplicateDomain(d)) if d == "triage"));
    }

    #[test]
    fn validate_delegates_to_schema() {
        let registry = SchemaRegistry::builder().register(triage()).unwrap().build();
        let errors = registry
            .validate("triage", &json!({"request_type": "bug", "first_call_resolution": true}))
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_name, "request_type");
        assert!(registry.validate("unknown", &json!({})).is_none());
    }

    #[test]
    fn builtin_registry_has_helpdesk_domain() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        assert_eq!(registry.domains(), vec![helpdesk::DOMAIN]);
        assert!(registry
            .instruction(helpdesk::DOMAIN)
            .unwrap()
            .contains("request_type"));
    }
}
