//! The bounded repair loop as an explicit state machine.
//!
//! `ExtractionRun` holds the state, the attempt history and the retry
//! budget. It performs no I/O: the pipeline drives it by reporting what
//! each generation call and validation produced, and the run decides
//! whether to succeed, retry or fail.

use serde::Serialize;

use super::{AttemptOutcome, ExtractionAttempt, GenerationError};
use crate::domain::foundation::{RunId, StateMachine, Timestamp, ValidationError};
use crate::domain::schema::FieldError;

/// Lifecycle of one extraction run.
///
/// ```text
/// Pending ──► Validating ──► Succeeded
///   │  ▲          │
///   │  │          ├────────► Failed
///   │  │          ▼
///   │  └──────  Retrying ──► Cancelled
///   ├──────────────► Retrying / Failed   (generation error)
///   └──────────────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionState {
    /// Ready to issue a generation call.
    Pending,
    /// A candidate is being checked against the schema.
    Validating,
    /// The last attempt failed and another is allowed.
    Retrying,
    Succeeded,
    Failed,
    Cancelled,
}

impl StateMachine for ExtractionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ExtractionState::*;
        matches!(
            (self, target),
            (Pending, Validating)
                | (Pending, Retrying)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Validating, Succeeded)
                | (Validating, Retrying)
                | (Validating, Failed)
                | (Retrying, Pending)
                | (Retrying, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ExtractionState::*;
        match self {
            Pending => vec![Validating, Retrying, Failed, Cancelled],
            Validating => vec![Succeeded, Retrying, Failed],
            Retrying => vec![Pending, Cancelled],
            Succeeded | Failed | Cancelled => vec![],
        }
    }
}

/// What the next request should tell the model about the last failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairFeedback {
    /// The previous answer, echoed back so the model can correct it.
    pub previous_output: Option<String>,
    pub errors: Vec<FieldError>,
}

/// State, history and budget of one run.
#[derive(Debug, Clone)]
pub struct ExtractionRun {
    run_id: RunId,
    max_attempts: u32,
    state: ExtractionState,
    attempts: Vec<ExtractionAttempt>,
    started_at: Timestamp,
}

impl ExtractionRun {
    /// Starts a run in `Pending`. A budget of zero is treated as one.
    pub fn new(run_id: RunId, max_attempts: u32) -> Self {
        Self {
            run_id,
            max_attempts: max_attempts.max(1),
            state: ExtractionState::Pending,
            attempts: Vec::new(),
            started_at: Timestamp::now(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn state(&self) -> ExtractionState {
        self.state
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempts(&self) -> &[ExtractionAttempt] {
        &self.attempts
    }

    /// Number of attempts recorded so far.
    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    /// Number the next attempt will carry.
    pub fn next_attempt_number(&self) -> u32 {
        self.attempt_count() + 1
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Milliseconds since the run started.
    pub fn elapsed_ms(&self) -> i64 {
        Timestamp::now().millis_since(&self.started_at)
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Feedback from the previous attempt, if it produced field errors.
    ///
    /// A generation failure with no output yields no feedback; the same
    /// request is simply issued again.
    pub fn feedback(&self) -> Option<RepairFeedback> {
        let last = self.attempts.last()?;
        if last.is_success() || last.field_errors().is_empty() {
            return None;
        }
        Some(RepairFeedback {
            previous_output: last.raw_candidate().map(str::to_string),
            errors: last.field_errors().to_vec(),
        })
    }

    /// A candidate arrived; `Pending → Validating`.
    pub fn begin_validation(&mut self) -> Result<(), ValidationError> {
        self.move_to(ExtractionState::Validating)
    }

    /// The candidate conformed; `Validating → Succeeded`.
    pub fn record_success(
        &mut self,
        raw_candidate: Option<String>,
        ignored_fields: Vec<String>,
    ) -> Result<(), ValidationError> {
        self.move_to(ExtractionState::Succeeded)?;
        let number = self.next_attempt_number();
        self.attempts
            .push(ExtractionAttempt::succeeded(number, raw_candidate, ignored_fields));
        Ok(())
    }

    /// The candidate had field errors; `Validating → Retrying | Failed`.
    pub fn record_rejection(
        &mut self,
        raw_candidate: Option<String>,
        errors: Vec<FieldError>,
    ) -> Result<ExtractionState, ValidationError> {
        let (next, outcome) = self.failure_transition();
        self.move_to(next)?;
        let number = self.next_attempt_number();
        self.attempts
            .push(ExtractionAttempt::rejected(number, raw_candidate, errors, outcome));
        Ok(next)
    }

    /// The call failed before any candidate; `Pending → Retrying | Failed`.
    ///
    /// `errors` carries the response-level error for empty output so the
    /// next request can explain it.
    pub fn record_generation_failure(
        &mut self,
        error: GenerationError,
        errors: Vec<FieldError>,
    ) -> Result<ExtractionState, ValidationError> {
        let (next, outcome) = self.failure_transition();
        self.move_to(next)?;
        let number = self.next_attempt_number();
        self.attempts
            .push(ExtractionAttempt::generation_failed(number, error, errors, outcome));
        Ok(next)
    }

    /// `Retrying → Pending`, before the next call.
    pub fn resume(&mut self) -> Result<(), ValidationError> {
        self.move_to(ExtractionState::Pending)
    }

    /// `Pending | Retrying → Cancelled`.
    pub fn cancel(&mut self) -> Result<(), ValidationError> {
        self.move_to(ExtractionState::Cancelled)
    }

    /// Consumes the run, returning its attempt history.
    pub fn into_attempts(self) -> Vec<ExtractionAttempt> {
        self.attempts
    }

    fn failure_transition(&self) -> (ExtractionState, AttemptOutcome) {
        if self.next_attempt_number() < self.max_attempts {
            (ExtractionState::Retrying, AttemptOutcome::RetryableFailure)
        } else {
            (ExtractionState::Failed, AttemptOutcome::TerminalFailure)
        }
    }

    fn move_to(&mut self, target: ExtractionState) -> Result<(), ValidationError> {
        self.state = self.state.transition_to(target)?;
        Ok(())
    }
}
