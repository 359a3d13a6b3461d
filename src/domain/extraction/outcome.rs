//! The value a pipeline run returns.

use super::{ExtractionAttempt, ExtractionFailure, ResultRecord};
use crate::domain::foundation::RunId;

/// Result of one run. Failure is a value here, not an `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Succeeded {
        run_id: RunId,
        record: ResultRecord,
        /// Every attempt, the last one being the success.
        attempts: Vec<ExtractionAttempt>,
    },
    Failed(ExtractionFailure),
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Succeeded { .. })
    }

    pub fn run_id(&self) -> RunId {
        match self {
            ExtractionOutcome::Succeeded { run_id, .. } => *run_id,
            ExtractionOutcome::Failed(failure) => failure.run_id,
        }
    }

    pub fn attempts(&self) -> &[ExtractionAttempt] {
        match self {
            ExtractionOutcome::Succeeded { attempts, .. } => attempts,
            ExtractionOutcome::Failed(failure) => &failure.attempts,
        }
    }

    pub fn record(&self) -> Option<&ResultRecord> {
        match self {
            ExtractionOutcome::Succeeded { record, .. } => Some(record),
            ExtractionOutcome::Failed(_) => None,
        }
    }

    /// Converts into a `Result` for callers that want `?`.
    pub fn into_result(self) -> Result<ResultRecord, ExtractionFailure> {
        match self {
            ExtractionOutcome::Succeeded { record, .. } => Ok(record),
            ExtractionOutcome::Failed(failure) => Err(failure),
        }
    }
}
