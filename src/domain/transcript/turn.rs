//! A single conversational turn.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::MalformedTranscriptError;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The caller or chat user.
    User,
    /// The bot or human agent answering the user.
    #[serde(alias = "assistant")]
    Agent,
    /// System or platform messages.
    System,
}

impl TurnRole {
    /// Upper-cased label used in the canonical transcript text.
    pub fn label(&self) -> &'static str {
        match self {
            TurnRole::User => "USER",
            TurnRole::Agent => "ASSISTANT",
            TurnRole::System => "SYSTEM",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TurnRole {
    type Err = String;

    /// Accepts the role names used by chat and agent services.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "human" | "caller" => Ok(TurnRole::User),
            "assistant" | "agent" | "bot" => Ok(TurnRole::Agent),
            "system" => Ok(TurnRole::System),
            other => Err(format!("unknown turn role '{}'", other)),
        }
    }
}

/// One message in a conversation.
///
/// Turns are immutable once created; the normalizer only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: TurnRole,
    text: String,
    sequence_index: u64,
}

impl Turn {
    /// Creates a turn, rejecting empty or whitespace-only text.
    pub fn new(
        role: TurnRole,
        text: impl Into<String>,
        sequence_index: u64,
    ) -> Result<Self, MalformedTranscriptError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(MalformedTranscriptError::EmptyTurnText { sequence_index });
        }
        Ok(Self {
            role,
            text,
            sequence_index,
        })
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sequence_index(&self) -> u64 {
        self.sequence_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_rejects_blank_text() {
        let result = Turn::new(TurnRole::User, "   ", 4);
        assert_eq!(
            result,
            Err(MalformedTranscriptError::EmptyTurnText { sequence_index: 4 })
        );
    }

    #[test]
    fn role_parses_service_names() {
        assert_eq!("assistant".parse::<TurnRole>(), Ok(TurnRole::Agent));
        assert_eq!("USER".parse::<TurnRole>(), Ok(TurnRole::User));
        assert_eq!("system".parse::<TurnRole>(), Ok(TurnRole::System));
        assert!("tool".parse::<TurnRole>().is_err());
    }

    #[test]
    fn role_deserializes_assistant_alias() {
        let role: TurnRole = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, TurnRole::Agent);
    }

    #[test]
    fn role_labels_are_upper_case() {
        assert_eq!(TurnRole::User.label(), "USER");
        assert_eq!(TurnRole::Agent.label(), "ASSISTANT");
        assert_eq!(TurnRole::System.to_string(), "SYSTEM");
    }
}
