//! Turns free-text model output into a JSON candidate.
//!
//! Providers without enforced structured output answer in prose that may
//! wrap the object in a markdown code fence or surround it with commentary.
//! The text is sanitized first, then the JSON is located and parsed.

use serde_json::Value;
use thiserror::Error;

/// Maximum accepted response length (100KB).
pub const MAX_RESPONSE_LENGTH: usize = 100_000;

const INJECTION_MARKERS: [&str; 11] = [
    "```system",
    "```assistant",
    "[INST]",
    "[/INST]",
    "<|system|>",
    "<|assistant|>",
    "<|user|>",
    "<|im_start|>",
    "<|im_end|>",
    "<<SYS>>",
    "<</SYS>>",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Response is empty")]
    Empty,

    #[error("Response too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("{0}")]
    InvalidJson(String),
}

/// Cleans raw model text before it is parsed.
#[derive(Debug, Clone, Default)]
pub struct ResponseSanitizer {
    additional_patterns: Vec<String>,
}

impl ResponseSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds patterns to strip on top of the built-in markers.
    pub fn with_additional_patterns(mut self, patterns: Vec<String>) -> Self {
        self.additional_patterns = patterns;
        self
    }

    /// Checks length, drops control characters (keeping newlines and tabs)
    /// and strips prompt injection markers.
    pub fn sanitize(&self, response: &str) -> Result<String, ParseError> {
        if response.len() > MAX_RESPONSE_LENGTH {
            return Err(ParseError::TooLong {
                max: MAX_RESPONSE_LENGTH,
                actual: response.len(),
            });
        }

        let mut cleaned: String = response
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
            .collect();

        for marker in INJECTION_MARKERS {
            cleaned = cleaned.replace(marker, "");
        }
        for pattern in &self.additional_patterns {
            cleaned = cleaned.replace(pattern.as_str(), "");
        }

        Ok(cleaned)
    }
}

/// Locates and parses the JSON value in a model response.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    sanitizer: ResponseSanitizer,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sanitizer(sanitizer: ResponseSanitizer) -> Self {
        Self { sanitizer }
    }

    /// Parses a free-text response into JSON.
    ///
    /// The result may be any JSON value; whether it is an object is for
    /// schema validation to decide.
    pub fn parse(&self, response: &str) -> Result<Value, ParseError> {
        let sanitized = self.sanitizer.sanitize(response)?;
        let trimmed = sanitized.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }

        locate_json(trimmed).map_err(|e| ParseError::InvalidJson(e.to_string()))
    }
}

/// Finds the JSON value: a code fence first, then the first `{` or `[`
/// from which a complete value parses, else the whole input.
///
/// Prose around the answer may itself contain brackets, so a position that
/// fails to parse moves the scan on to the next one. The reported error is
/// the one from the earliest candidate.
fn locate_json(text: &str) -> Result<Value, serde_json::Error> {
    if let Some(fenced) = from_code_block(text) {
        return serde_json::from_str(fenced);
    }

    let mut first_error = None;
    for (start, _) in text.char_indices().filter(|(_, c)| matches!(c, '{' | '[')) {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => return Ok(value),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => serde_json::from_str(text),
    }
}

fn from_code_block(text: &str) -> Option<&str> {
    for opener in ["```json", "```JSON", "```"] {
        let Some(start) = text.find(opener) else {
            continue;
        };
        let after = &text[start + opener.len()..];
        // The fence line must end right after the opener.
        let Some(body_start) = after.find('\n') else {
            continue;
        };
        if !after[..body_start].trim().is_empty() {
            continue;
        }
        let body = &after[body_start + 1..];
        if let Some(end) = body.find("```") {
            return Some(body[..end].trim());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod sanitizer {
        use super::*;

        #[test]
        fn rejects_too_long_response() {
            let long = "a".repeat(MAX_RESPONSE_LENGTH + 1);
            assert!(matches!(
                ResponseSanitizer::new().sanitize(&long),
                Err(ParseError::TooLong { .. })
            ));
        }

        #[test]
        fn removes_control_characters_but_keeps_whitespace() {
            let result = ResponseSanitizer::new().sanitize("a\x00b\x07\n\tc").unwrap();
            assert_eq!(result, "ab\n\tc");
        }

        #[test]
        fn strips_injection_markers() {
            let result = ResponseSanitizer::new()
                .sanitize("<|im_start|>{\"a\": 1}<|im_end|> [INST]")
                .unwrap();
            assert_eq!(result, "{\"a\": 1} ");
        }

        #[test]
        fn uses_additional_patterns() {
            let result = ResponseSanitizer::new()
                .with_additional_patterns(vec!["<<END>>".to_string()])
                .sanitize("done<<END>>")
                .unwrap();
            assert_eq!(result, "done");
        }
    }

    mod parser {
        use super::*;

        #[test]
        fn parses_plain_json() {
            let value = ResponseParser::new()
                .parse(r#"{"request_type": "incident"}"#)
                .unwrap();
            assert_eq!(value, json!({"request_type": "incident"}));
        }

        #[test]
        fn parses_json_code_fence() {
            let text = "Here is the analysis:\n```json\n{\"first_call_resolution\": true}\n```\nLet me know!";
            assert_eq!(
                ResponseParser::new().parse(text).unwrap(),
                json!({"first_call_resolution": true})
            );
        }

        #[test]
        fn parses_unlabelled_code_fence() {
            let text = "```\n{\"a\": [1, 2]}\n```";
            assert_eq!(ResponseParser::new().parse(text).unwrap(), json!({"a": [1, 2]}));
        }

        #[test]
        fn finds_object_after_preamble() {
            let text = "Sure! {\"summary\": \"user said {hi} \\\"twice\\\"\"} Hope this helps.";
            assert_eq!(
                ResponseParser::new().parse(text).unwrap(),
                json!({"summary": "user said {hi} \"twice\""})
            );
        }

        #[test]
        fn skips_braces_in_prose_before_the_object() {
            let text = "Using the {request_type} field: {\"request_type\": \"incident\"}";
            assert_eq!(
                ResponseParser::new().parse(text).unwrap(),
                json!({"request_type": "incident"})
            );
        }

        #[test]
        fn skips_unclosed_bracket_before_the_object() {
            let text = "Result [draft {\"a\": 1}";
            assert_eq!(ResponseParser::new().parse(text).unwrap(), json!({"a": 1}));
        }

        #[test]
        fn handles_multibyte_text_before_closing_brace() {
            let text = "Résumé: {\"note\": \"café ☕\"}";
            assert_eq!(
                ResponseParser::new().parse(text).unwrap(),
                json!({"note": "café ☕"})
            );
        }

        #[test]
        fn returns_arrays_unchanged() {
            assert_eq!(ResponseParser::new().parse("[1, 2]").unwrap(), json!([1, 2]));
        }

        #[test]
        fn blank_response_is_empty() {
            assert_eq!(ResponseParser::new().parse("  \n "), Err(ParseError::Empty));
        }

        #[test]
        fn prose_is_invalid_json() {
            assert!(matches!(
                ResponseParser::new().parse("I could not analyze this conversation."),
                Err(ParseError::InvalidJson(_))
            ));
        }

        #[test]
        fn unbalanced_object_is_invalid_json() {
            assert!(matches!(
                ResponseParser::new().parse("{\"a\": 1"),
                Err(ParseError::InvalidJson(_))
            ));
        }
    }
}
