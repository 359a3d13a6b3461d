//! Field specifications and per-field kind checks.

use serde_json::Value;

use super::{json_type_name, FieldErrorReason, FieldValue, SchemaDefinitionError};

/// The kind of value a field holds, with its constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, optionally bounded in characters.
    Text { max_length: Option<usize> },
    /// Whole number, optionally bounded (inclusive).
    Integer { min: Option<i64>, max: Option<i64> },
    Boolean,
    /// Closed set of string tokens, fixed when the schema is defined.
    Enumeration { allowed_values: Vec<String> },
    /// List of strings, optionally bounded in length.
    StringList { max_items: Option<usize> },
}

impl FieldKind {
    /// Short description used in instructions and mismatch messages.
    pub fn describe(&self) -> String {
        match self {
            FieldKind::Text { max_length: None } => "string".to_string(),
            FieldKind::Text {
                max_length: Some(max),
            } => format!("string of at most {} characters", max),
            FieldKind::Integer { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("integer between {} and {}", min, max),
                (Some(min), None) => format!("integer of at least {}", min),
                (None, Some(max)) => format!("integer of at most {}", max),
                (None, None) => "integer".to_string(),
            },
            FieldKind::Boolean => "boolean".to_string(),
            FieldKind::Enumeration { allowed_values } => {
                let quoted: Vec<String> =
                    allowed_values.iter().map(|v| format!("\"{}\"", v)).collect();
                format!("one of {}", quoted.join(", "))
            }
            FieldKind::StringList { max_items: None } => "list of strings".to_string(),
            FieldKind::StringList {
                max_items: Some(max),
            } => format!("list of at most {} strings", max),
        }
    }

    fn expected_type(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } | FieldKind::Enumeration { .. } => "string",
            FieldKind::Integer { .. } => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::StringList { .. } => "list of strings",
        }
    }
}

/// One entry in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    required: bool,
    description: Option<String>,
    default: Option<FieldValue>,
}

impl FieldSpec {
    /// Creates a required field of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
            default: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text { max_length: None })
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer { min: None, max: None })
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, allowed_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FieldKind::Enumeration {
                allowed_values: allowed_values.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn string_list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StringList { max_items: None })
    }

    /// Marks the field as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the value used when the field is absent. Implies optional.
    pub fn with_default(mut self, default: FieldValue) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Bounds a text field's length. No effect on other kinds.
    pub fn max_length(mut self, max: usize) -> Self {
        if let FieldKind::Text { max_length } = &mut self.kind {
            *max_length = Some(max);
        }
        self
    }

    /// Bounds an integer field (inclusive). No effect on other kinds.
    pub fn range(mut self, lower: i64, upper: i64) -> Self {
        if let FieldKind::Integer { min, max } = &mut self.kind {
            *min = Some(lower);
            *max = Some(upper);
        }
        self
    }

    /// Bounds a list field's length. No effect on other kinds.
    pub fn max_items(mut self, max: usize) -> Self {
        if let FieldKind::StringList { max_items } = &mut self.kind {
            *max_items = Some(max);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default_value(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }

    /// Allowed tokens, for enumeration fields.
    pub fn allowed_values(&self) -> Option<&[String]> {
        match &self.kind {
            FieldKind::Enumeration { allowed_values } => Some(allowed_values),
            _ => None,
        }
    }

    /// Checks a present, non-null value against this field's kind.
    ///
    /// Harmless formatting variance is coerced once before a mismatch is
    /// reported: numeric strings and integral floats become integers, and
    /// `"true"`/`"false"` strings become booleans. Enumeration tokens are
    /// matched exactly.
    pub fn check(&self, value: &Value) -> Result<FieldValue, FieldErrorReason> {
        match &self.kind {
            FieldKind::Text { max_length } => {
                let text = value.as_str().ok_or_else(|| self.mismatch(value))?;
                if let Some(max) = max_length {
                    let actual = text.chars().count();
                    if actual > *max {
                        return Err(FieldErrorReason::TooLong { max: *max, actual });
                    }
                }
                Ok(FieldValue::Text(text.to_string()))
            }
            FieldKind::Integer { min, max } => {
                let number = coerce_integer(value).ok_or_else(|| self.mismatch(value))?;
                let below = min.is_some_and(|m| number < m);
                let above = max.is_some_and(|m| number > m);
                if below || above {
                    return Err(FieldErrorReason::OutOfRange {
                        value: number,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(FieldValue::Integer(number))
            }
            FieldKind::Boolean => coerce_bool(value)
                .map(FieldValue::Boolean)
                .ok_or_else(|| self.mismatch(value)),
            FieldKind::Enumeration { allowed_values } => {
                let token = value.as_str().ok_or_else(|| self.mismatch(value))?;
                if allowed_values.iter().any(|allowed| allowed == token) {
                    Ok(FieldValue::Token(token.to_string()))
                } else {
                    Err(FieldErrorReason::NotAllowed {
                        value: token.to_string(),
                        allowed: allowed_values.clone(),
                    })
                }
            }
            FieldKind::StringList { max_items } => {
                let items = value.as_array().ok_or_else(|| self.mismatch(value))?;
                let mut strings = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) => strings.push(s.to_string()),
                        None => {
                            return Err(FieldErrorReason::TypeMismatch {
                                expected: "list of strings".to_string(),
                                found: format!("list containing {}", json_type_name(item)),
                            })
                        }
                    }
                }
                if let Some(max) = max_items {
                    if strings.len() > *max {
                        return Err(FieldErrorReason::TooManyItems {
                            max: *max,
                            actual: strings.len(),
                        });
                    }
                }
                Ok(FieldValue::List(strings))
            }
        }
    }

    /// Checks the definition itself: names, token sets, ranges and defaults.
    pub(crate) fn check_definition(&self) -> Result<(), SchemaDefinitionError> {
        if self.name.trim().is_empty() {
            return Err(SchemaDefinitionError::EmptyFieldName);
        }
        match &self.kind {
            FieldKind::Enumeration { allowed_values } => {
                if allowed_values.is_empty() {
                    return Err(SchemaDefinitionError::EmptyEnumeration(self.name.clone()));
                }
                for (i, value) in allowed_values.iter().enumerate() {
                    if allowed_values[..i].contains(value) {
                        return Err(SchemaDefinitionError::DuplicateToken {
                            field: self.name.clone(),
                            value: value.clone(),
                        });
                    }
                }
            }
            FieldKind::Integer {
                min: Some(min),
                max: Some(max),
            } if min > max => {
                return Err(SchemaDefinitionError::InvertedRange(self.name.clone()));
            }
            _ => {}
        }
        if let Some(default) = &self.default {
            self.check(&default.to_json())
                .map_err(|reason| SchemaDefinitionError::InvalidDefault {
                    field: self.name.clone(),
                    reason: reason.to_string(),
                })?;
        }
        Ok(())
    }

    fn mismatch(&self, value: &Value) -> FieldErrorReason {
        FieldErrorReason::TypeMismatch {
            expected: self.kind.expected_type().to_string(),
            found: json_type_name(value).to_string(),
        }
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
