//! Extraction loop configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::schema::UnknownFieldPolicy;

/// Upper bound accepted for `max_attempts`.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Schema domain to extract
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Total attempts per transcript, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub unknown_fields: UnknownFieldPolicy,

    /// Directory holding `<thread_id>.jsonl` transcript exports
    #[serde(default = "default_transcripts_dir")]
    pub transcripts_dir: PathBuf,
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.domain.trim().is_empty() {
            return Err(ValidationError::EmptyDomain);
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            return Err(ValidationError::InvalidMaxAttempts {
                found: self.max_attempts,
                max: MAX_ATTEMPTS_LIMIT,
            });
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            max_attempts: default_max_attempts(),
            unknown_fields: UnknownFieldPolicy::default(),
            transcripts_dir: default_transcripts_dir(),
        }
    }
}

fn default_domain() -> String {
    crate::domain::schema::helpdesk::DOMAIN.to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_transcripts_dir() -> PathBuf {
    PathBuf::from("./transcripts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExtractionConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.unknown_fields, UnknownFieldPolicy::Ignore);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn max_attempts_outside_range_is_rejected() {
        for found in [0, 11] {
            let config = ExtractionConfig {
                max_attempts: found,
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ValidationError::InvalidMaxAttempts { found, max: 10 })
            );
        }
    }

    #[test]
    fn blank_domain_is_rejected() {
        let config = ExtractionConfig {
            domain: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyDomain));
    }
}
