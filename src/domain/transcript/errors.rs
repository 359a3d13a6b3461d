//! Input contract violations for transcripts.

use thiserror::Error;

/// The transcript violates its input contract.
///
/// Raised before any external call is made and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTranscriptError {
    #[error("Transcript contains no turns")]
    Empty,

    #[error(
        "Turn at position {position} has sequence index {found}, which does not follow {previous}"
    )]
    NonIncreasingIndex {
        position: usize,
        previous: u64,
        found: u64,
    },

    #[error("Turn with sequence index {sequence_index} has empty text")]
    EmptyTurnText { sequence_index: u64 },
}
