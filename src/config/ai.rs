//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Provider used for extraction calls
    #[serde(default)]
    pub provider: AiProvider,

    /// Model name, or deployment name for Azure. Provider default when unset.
    pub model: Option<String>,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Azure OpenAI resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub azure_endpoint: Option<String>,

    pub azure_api_key: Option<String>,

    #[serde(default = "default_azure_api_version")]
    pub azure_api_version: String,

    /// Override for the provider's API base URL
    pub base_url: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature; 0.0 asks for the most deterministic output
    #[serde(default)]
    pub temperature: f32,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
    Anthropic,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    pub fn has_azure(&self) -> bool {
        self.azure_api_key.as_ref().is_some_and(|k| !k.is_empty())
            && self.azure_endpoint.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.provider {
            AiProvider::OpenAI if !self.has_openai() => {
                return Err(ValidationError::MissingRequired("AI__OPENAI_API_KEY"));
            }
            AiProvider::Anthropic if !self.has_anthropic() => {
                return Err(ValidationError::MissingRequired("AI__ANTHROPIC_API_KEY"));
            }
            AiProvider::AzureOpenAI => {
                if !self.has_azure() {
                    return Err(ValidationError::MissingRequired(
                        "AI__AZURE_ENDPOINT and AI__AZURE_API_KEY",
                    ));
                }
                if self.model.is_none() {
                    return Err(ValidationError::MissingRequired("AI__MODEL"));
                }
                let endpoint = self.azure_endpoint.as_deref().unwrap_or_default();
                if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                    return Err(ValidationError::InvalidAzureEndpoint(endpoint.to_string()));
                }
            }
            _ => {}
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_output_tokens == 0 {
            return Err(ValidationError::InvalidMaxOutputTokens);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            model: None,
            openai_api_key: None,
            anthropic_api_key: None,
            azure_endpoint: None,
            azure_api_key: None,
            azure_api_version: default_azure_api_version(),
            base_url: None,
            timeout_secs: default_timeout(),
            max_output_tokens: default_max_output_tokens(),
            temperature: 0.0,
        }
    }
}

fn default_azure_api_version() -> String {
    "2024-08-01-preview".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_output_tokens() -> u32 {
    4096
}
