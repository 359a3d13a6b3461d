//! Renders a schema as model-facing instructions and as a strict JSON Schema.

use serde_json::{json, Map, Value};

use super::{FieldKind, FieldSpec, Schema};

impl Schema {
    /// Human-readable description of the expected output.
    ///
    /// Lists every field in order with its kind, whether it is required,
    /// its description and, for enumerations, the exact token list.
    pub fn instruction(&self) -> String {
        let heading = self.title().unwrap_or_else(|| self.domain());
        let mut out = format!(
            "Respond with a single JSON object ({}) containing exactly these fields:\n",
            heading
        );

        for spec in self.fields() {
            out.push_str(&field_line(spec));
            out.push('\n');
        }

        out.push_str(
            "\nRules:\n\
             - Use the exact enumeration tokens shown, with the same spelling and case.\n\
             - Use null for optional fields that do not apply.\n\
             - Do not add fields that are not listed.\n\
             - Output only the JSON object, with no surrounding prose.",
        );
        out
    }

    /// Strict JSON Schema for providers that enforce structured output.
    ///
    /// Strict mode needs every property listed as required, so optional
    /// fields are expressed as nullable instead. Bounds that strict mode
    /// does not enforce are carried in the property description and
    /// checked by validation.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for spec in self.fields() {
            properties.insert(spec.name().to_string(), property_schema(spec));
        }
        let required: Vec<&str> = self.fields().iter().map(|f| f.name()).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }
}

fn field_line(spec: &FieldSpec) -> String {
    let presence = match (spec.is_required(), spec.default_value()) {
        (true, _) => "required".to_string(),
        (false, Some(default)) => format!("optional, default {}", default.to_json()),
        (false, None) => "optional".to_string(),
    };
    let mut line = format!("- {} ({}): {}", spec.name(), presence, spec.kind().describe());
    if let Some(description) = spec.description() {
        line.push_str(". ");
        line.push_str(description);
    }
    line
}

fn property_schema(spec: &FieldSpec) -> Value {
    let nullable = !spec.is_required();
    let type_of = |name: &str| {
        if nullable {
            json!([name, "null"])
        } else {
            json!(name)
        }
    };

    let mut description = spec.kind().describe();
    if let Some(text) = spec.description() {
        description = format!("{}. {}", text, description);
    }

    let mut property = match spec.kind() {
        FieldKind::Text { .. } => json!({ "type": type_of("string") }),
        FieldKind::Integer { .. } => json!({ "type": type_of("integer") }),
        FieldKind::Boolean => json!({ "type": type_of("boolean") }),
        FieldKind::Enumeration { allowed_values } => {
            let mut tokens: Vec<Value> = allowed_values.iter().cloned().map(Value::String).collect();
            if nullable {
                tokens.push(Value::Null);
            }
            json!({ "type": type_of("string"), "enum": tokens })
        }
        FieldKind::StringList { .. } => json!({
            "type": type_of("array"),
            "items": { "type": "string" }
        }),
    };

    if let Value::Object(map) = &mut property {
        map.insert("description".to_string(), Value::String(description));
    }
    property
}

#[cfg(test)]
mod tests {
    use crate::domain::schema::{FieldSpec, FieldValue, Schema};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder("triage")
            .title("Ticket triage")
            .field(
                FieldSpec::enumeration("request_type", ["incident", "service_request"])
                    .describe("Whether something is broken or something is requested"),
            )
            .field(FieldSpec::boolean("first_call_resolution"))
            .field(FieldSpec::enumeration("priority", ["low", "high"]).optional())
            .field(FieldSpec::string_list("keywords").max_items(5).with_default(FieldValue::List(vec![])))
            .build()
            .unwrap()
    }

    #[test]
    fn instruction_lists_fields_in_order_with_tokens() {
        let text = schema().instruction();
        assert!(text.contains("Ticket triage"));

        let request_type = text.find("- request_type (required)").unwrap();
        let fcr = text.find("- first_call_resolution (required): boolean").unwrap();
        let priority = text.find("- priority (optional)").unwrap();
        assert!(request_type < fcr && fcr < priority);

        assert!(text.contains("one of \"incident\", \"service_request\""));
        assert!(text.contains("Whether something is broken"));
        assert!(text.contains("- keywords (optional, default [])"));
    }

    #[test]
    fn json_schema_is_closed_and_requires_every_property() {
        let doc = schema().json_schema();
        assert_eq!(doc["additionalProperties"], json!(false));
        assert_eq!(
            doc["required"],
            json!(["request_type", "first_call_resolution", "priority", "keywords"])
        );
    }

    #[test]
    fn json_schema_marks_optional_fields_nullable() {
        let doc = schema().json_schema();
        assert_eq!(doc["properties"]["request_type"]["type"], json!("string"));
        assert_eq!(doc["properties"]["priority"]["type"], json!(["string", "null"]));
        assert_eq!(doc["properties"]["priority"]["enum"], json!(["low", "high", null]));
        assert_eq!(doc["properties"]["keywords"]["items"]["type"], json!("string"));
    }

    #[test]
    fn json_schema_describes_bounds() {
        let doc = schema().json_schema();
        let description = doc["properties"]["keywords"]["description"].as_str().unwrap();
        assert!(description.contains("at most 5"));
    }
}
