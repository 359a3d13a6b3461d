//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("max_output_tokens must be positive")]
    InvalidMaxOutputTokens,

    #[error("max_attempts must be between 1 and {max}, got {found}")]
    InvalidMaxAttempts { found: u32, max: u32 },

    #[error("Extraction domain must not be empty")]
    EmptyDomain,

    #[error("Invalid Azure endpoint URL: {0}")]
    InvalidAzureEndpoint(String),
}
