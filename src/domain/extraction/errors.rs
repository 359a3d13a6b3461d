//! Errors raised by extraction and by record accessors.

use serde::Serialize;
use thiserror::Error;

use super::ExtractionAttempt;
use crate::domain::foundation::RunId;
use crate::domain::schema::FieldError;

/// The generation call itself failed, so there is no candidate to validate.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationError {
    /// Transport, authentication, rate limit or timeout. The provider's
    /// message is kept verbatim.
    #[error("Generation unavailable: {message}")]
    Unavailable { message: String },

    /// The call succeeded but produced no content.
    #[error("Generation returned no content")]
    Empty,
}

impl GenerationError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Misuse of a [`ResultRecord`](super::ResultRecord) accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldAccessError {
    /// The field is declared but optional and absent from this record.
    #[error("Field '{0}' has no value in this record")]
    NotPresent(String),

    /// The record's schema does not declare this field.
    #[error("Field '{field}' is not part of the '{domain}' schema")]
    NotInSchema { field: String, domain: String },

    /// The field holds a different kind of value than requested.
    #[error("Field '{field}' is not a {expected}")]
    WrongKind { field: String, expected: &'static str },
}

/// Why a run ended without a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Every allowed attempt failed.
    AttemptsExhausted,
    /// Cancellation was observed before a new call.
    Cancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::AttemptsExhausted => write!(f, "attempts exhausted"),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal failure of one extraction run, with every attempt attached.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("Extraction for '{domain}' failed ({reason}) after {} attempt(s)", .attempts.len())]
pub struct ExtractionFailure {
    pub run_id: RunId,
    pub domain: String,
    pub reason: FailureReason,
    pub attempts: Vec<ExtractionAttempt>,
}

impl ExtractionFailure {
    /// Field errors of the last attempt, if it got as far as producing output.
    pub fn last_field_errors(&self) -> &[FieldError] {
        self.attempts
            .last()
            .map(|a| a.field_errors())
            .unwrap_or(&[])
    }

    /// Generation error of the last attempt, if the call itself failed.
    pub fn last_generation_error(&self) -> Option<&GenerationError> {
        self.attempts.last().and_then(|a| a.generation_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_keeps_provider_message() {
        let err = GenerationError::unavailable("HTTP 503: upstream overloaded");
        assert_eq!(
            err.to_string(),
            "Generation unavailable: HTTP 503: upstream overloaded"
        );
    }

    #[test]
    fn failure_without_attempts_has_no_errors() {
        let failure = ExtractionFailure {
            run_id: RunId::new(),
            domain: "triage".to_string(),
            reason: FailureReason::Cancelled,
            attempts: Vec::new(),
        };
        assert!(failure.last_field_errors().is_empty());
        assert!(failure.last_generation_error().is_none());
        assert_eq!(
            failure.to_string(),
            "Extraction for 'triage' failed (cancelled) after 0 attempt(s)"
        );
    }

    #[test]
    fn access_errors_name_the_field() {
        let err = FieldAccessError::NotInSchema {
            field: "mood".to_string(),
            domain: "triage".to_string(),
        };
        assert_eq!(err.to_string(), "Field 'mood' is not part of the 'triage' schema");
    }
}
