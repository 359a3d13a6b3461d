//! Transcript module - conversational turns and their canonical rendering.

mod errors;
mod normalizer;
mod transcript;
mod turn;

pub use errors::MalformedTranscriptError;
pub use normalizer::{normalize, TURN_SEPARATOR};
pub use transcript::Transcript;
pub use turn::{Turn, TurnRole};
