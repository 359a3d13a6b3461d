//! Ordered sequence of turns making up one conversation.

use serde::{Deserialize, Serialize};

use super::{MalformedTranscriptError, Turn, TurnRole};

/// An ordered sequence of turns representing one full conversation.
///
/// Construction does not enforce ordering so that callers can hand over
/// whatever their source produced; [`Transcript::validate`] (and therefore
/// the normalizer) reports contract violations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Wraps turns as supplied by the caller.
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Builds a transcript from `(role, text)` pairs in arrival order,
    /// assigning sequence indices from zero.
    pub fn from_messages<I, S>(messages: I) -> Result<Self, MalformedTranscriptError>
    where
        I: IntoIterator<Item = (TurnRole, S)>,
        S: Into<String>,
    {
        let turns = messages
            .into_iter()
            .enumerate()
            .map(|(index, (role, text))| Turn::new(role, text, index as u64))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { turns })
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of turns authored by the given role.
    pub fn count_by_role(&self, role: TurnRole) -> usize {
        self.turns.iter().filter(|t| t.role() == role).count()
    }

    /// Checks the transcript contract: non-empty, non-blank turns and
    /// strictly increasing sequence indices.
    pub fn validate(&self) -> Result<(), MalformedTranscriptError> {
        if self.turns.is_empty() {
            return Err(MalformedTranscriptError::Empty);
        }

        let mut previous: Option<u64> = None;
        for (position, turn) in self.turns.iter().enumerate() {
            if turn.text().trim().is_empty() {
                return Err(MalformedTranscriptError::EmptyTurnText {
                    sequence_index: turn.sequence_index(),
                });
            }
            if let Some(prev) = previous {
                if turn.sequence_index() <= prev {
                    return Err(MalformedTranscriptError::NonIncreasingIndex {
                        position,
                        previous: prev,
                        found: turn.sequence_index(),
                    });
                }
            }
            previous = Some(turn.sequence_index());
        }

        Ok(())
    }
}
