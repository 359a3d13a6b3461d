//! One generation-plus-validation cycle within a run.

use serde::Serialize;

use super::GenerationError;
use crate::domain::foundation::Timestamp;
use crate::domain::schema::FieldError;

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// Failed, and another attempt was allowed.
    RetryableFailure,
    /// Failed with no attempts left.
    TerminalFailure,
}

/// Diagnostics for one attempt. Never persisted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionAttempt {
    number: u32,
    raw_candidate: Option<String>,
    field_errors: Vec<FieldError>,
    generation_error: Option<GenerationError>,
    outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ignored_fields: Vec<String>,
    finished_at: Timestamp,
}

impl ExtractionAttempt {
    pub(crate) fn succeeded(number: u32, raw_candidate: Option<String>, ignored_fields: Vec<String>) -> Self {
        Self {
            number,
            raw_candidate,
            field_errors: Vec::new(),
            generation_error: None,
            outcome: AttemptOutcome::Success,
            ignored_fields,
            finished_at: Timestamp::now(),
        }
    }

    pub(crate) fn rejected(
        number: u32,
        raw_candidate: Option<String>,
        field_errors: Vec<FieldError>,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            number,
            raw_candidate,
            field_errors,
            generation_error: None,
            outcome,
            ignored_fields: Vec::new(),
            finished_at: Timestamp::now(),
        }
    }

    pub(crate) fn generation_failed(
        number: u32,
        error: GenerationError,
        field_errors: Vec<FieldError>,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            number,
            raw_candidate: None,
            field_errors,
            generation_error: Some(error),
            outcome,
            ignored_fields: Vec::new(),
            finished_at: Timestamp::now(),
        }
    }

    /// Attempt number, starting at 1.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Raw model output, when the call produced any.
    pub fn raw_candidate(&self) -> Option<&str> {
        self.raw_candidate.as_deref()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn generation_error(&self) -> Option<&GenerationError> {
        self.generation_error.as_ref()
    }

    pub fn outcome(&self) -> AttemptOutcome {
        self.outcome
    }

    /// Undeclared fields dropped from a successful candidate.
    pub fn ignored_fields(&self) -> &[String] {
        &self.ignored_fields
    }

    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Success
    }

    pub fn finished_at(&self) -> Timestamp {
        self.finished_at
    }
}
