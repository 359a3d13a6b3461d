//! Extraction module - the validator/repair loop and its results.
//!
//! Everything here is free of I/O. The pipeline in the application layer
//! calls the model and reports what came back to an [`ExtractionRun`],
//! which owns the retry budget and the attempt history.

mod attempt;
mod errors;
mod outcome;
mod prompt;
mod record;
mod response_parser;
mod run;

pub use attempt::{AttemptOutcome, ExtractionAttempt};
pub use errors::{ExtractionFailure, FailureReason, FieldAccessError, GenerationError};
pub use outcome::ExtractionOutcome;
pub use prompt::{repair_message, PromptTemplate};
pub use record::ResultRecord;
pub use response_parser::{ParseError, ResponseParser, ResponseSanitizer, MAX_RESPONSE_LENGTH};
pub use run::{ExtractionRun, ExtractionState, RepairFeedback};
