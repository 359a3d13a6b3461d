//! OpenAI Provider - Implementation of AIProvider for OpenAI chat completions.
//!
//! Serves both the public OpenAI API and Azure OpenAI deployments, which
//! share the request and response shapes but differ in URL layout and
//! authentication header.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let azure = OpenAIConfig::azure(api_key, "https://my-resource.openai.azure.com", "2024-08-01-preview")
//!     .with_model("gpt-4-1-analytics");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```
//!
//! # Structured output
//!
//! `ResponseFormat::JsonSchema` is sent as a strict `json_schema` response
//! format, so the service itself constrains the output shape. A refusal is
//! reported as empty content with `FinishReason::ContentFilter`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, ResponseFormat, TokenUsage,
};

/// Where requests are sent and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAIEndpoint {
    /// `{base_url}/chat/completions` with a bearer token.
    OpenAI { base_url: String },
    /// `{endpoint}/openai/deployments/{model}/chat/completions?api-version=...`
    /// with an `api-key` header. The model is the deployment name.
    Azure { endpoint: String, api_version: String },
}

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model, or deployment name on Azure.
    pub model: String,
    pub endpoint: OpenAIEndpoint,
    /// Transport-level request timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Creates a configuration for the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o".to_string(),
            endpoint: OpenAIEndpoint::OpenAI {
                base_url: "https://api.openai.com/v1".to_string(),
            },
            timeout: Duration::from_secs(60),
        }
    }

    /// Creates a configuration for an Azure OpenAI resource.
    pub fn azure(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: OpenAIEndpoint::Azure {
                endpoint: endpoint.into(),
                api_version: api_version.into(),
            },
            ..Self::new(api_key)
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the base URL. Only applies to the public API.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let OpenAIEndpoint::OpenAI { base_url } = &mut self.endpoint {
            *base_url = url.into();
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    fn is_azure(&self) -> bool {
        matches!(self.endpoint, OpenAIEndpoint::Azure { .. })
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        match &self.config.endpoint {
            OpenAIEndpoint::OpenAI { base_url } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
            OpenAIEndpoint::Azure {
                endpoint,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint.trim_end_matches('/'),
                self.config.model,
                api_version
            ),
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.config.is_azure() {
            builder.header("api-key", self.config.api_key())
        } else {
            builder.header("Authorization", format!("Bearer {}", self.config.api_key()))
        }
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(prompt.clone()),
                refusal: None,
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: Some(msg.content.clone()),
                refusal: None,
            });
        }

        OpenAIRequest {
            // Azure takes the deployment from the URL.
            model: (!self.config.is_azure()).then(|| self.config.model.clone()),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: response_format_json(&request.response_format),
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let openai_request = self.to_openai_request(request);

        self.authorize(self.client.post(self.completions_url()))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses to errors, keeping the body text.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "OpenAI request failed");

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(parse_retry_after(&error_body))),
            400 => {
                if error_body.contains("maximum context length")
                    || error_body.contains("context_length_exceeded")
                {
                    Err(AIError::context_too_long(0, 0))
                } else {
                    Err(AIError::InvalidRequest(error_body))
                }
            }
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let refused = choice.message.refusal.is_some();
        let finish_reason = match choice.finish_reason.as_deref() {
            _ if refused => FinishReason::ContentFilter,
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        let usage = openai_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: if refused {
                String::new()
            } else {
                choice.message.content.unwrap_or_default()
            },
            usage,
            model: openai_response.model,
            finish_reason,
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        tracing::debug!(
            run_id = %request.metadata.run_id,
            attempt = request.metadata.attempt,
            model = %self.config.model,
            "Sending OpenAI chat completion"
        );
        let response = self.send_request(&request).await?;
        let completion = self.parse_response(response).await?;
        tracing::debug!(
            run_id = %request.metadata.run_id,
            total_tokens = completion.usage.total_tokens,
            "OpenAI completion received"
        );
        Ok(completion)
    }

    fn provider_info(&self) -> ProviderInfo {
        let max_context = match self.config.model.as_str() {
            m if m.starts_with("gpt-4.1") => 1_047_576,
            m if m.starts_with("gpt-4o") || m.starts_with("gpt-4-turbo") => 128_000,
            m if m.starts_with("gpt-4") => 8_192,
            m if m.starts_with("gpt-3.5") => 16_385,
            _ => 128_000,
        };
        let name = if self.config.is_azure() {
            "azure_openai"
        } else {
            "openai"
        };

        ProviderInfo::new(name, &self.config.model, max_context).with_structured_output(true)
    }
}

fn response_format_json(format: &ResponseFormat) -> Option<Value> {
    match format {
        ResponseFormat::Text => None,
        ResponseFormat::JsonObject => Some(json!({ "type": "json_object" })),
        ResponseFormat::JsonSchema {
            name,
            schema,
            strict,
        } => Some(json!({
            "type": "json_schema",
            "json_schema": {
                "name": name,
                "schema": schema,
                "strict": strict
            }
        })),
    }
}

/// Parses "try again in Ns" from an error body, defaulting to 30 seconds.
fn parse_retry_after(error_body: &str) -> u32 {
    let message = serde_json::from_str::<Value>(error_body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string));

    message
        .as_deref()
        .and_then(|s| s.find("try again in ").map(|idx| &s[idx + 13..]))
        .and_then(|rest| {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        })
        .unwrap_or(30)
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RunId;
    use crate::ports::RequestMetadata;

    fn request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(RunId::new(), 1))
            .with_system_prompt("Extract fields")
            .with_message(MessageRole::User, "USER: printer broken")
            .with_temperature(0.0)
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o-mini")
            .with_base_url("https://custom.api.com/v1")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(
            config.endpoint,
            OpenAIEndpoint::OpenAI {
                base_url: "https://custom.api.com/v1".to_string()
            }
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn openai_url_uses_base_url() {
        let provider =
            OpenAIProvider::new(OpenAIConfig::new("k").with_base_url("https://api.example.com/v1/"))
                .unwrap();
        assert_eq!(
            provider.completions_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn azure_url_names_deployment_and_version() {
        let config = OpenAIConfig::azure("k", "https://res.openai.azure.com/", "2024-08-01-preview")
            .with_model("analytics-gpt41");
        let provider = OpenAIProvider::new(config).unwrap();
        assert_eq!(
            provider.completions_url(),
            "https://res.openai.azure.com/openai/deployments/analytics-gpt41/chat/completions?api-version=2024-08-01-preview"
        );
    }

    #[test]
    fn azure_base_url_override_is_ignored() {
        let config = OpenAIConfig::azure("k", "https://res.openai.azure.com", "v").with_base_url("x");
        assert_eq!(
            config.endpoint,
            OpenAIEndpoint::Azure {
                endpoint: "https://res.openai.azure.com".to_string(),
                api_version: "v".to_string()
            }
        );
    }

    #[test]
    fn request_places_system_prompt_first() {
        let provider = OpenAIProvider::new(OpenAIConfig::new("k")).unwrap();
        let body = serde_json::to_value(provider.to_openai_request(&request())).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "USER: printer broken");
        assert_eq!(body["model"], "gpt-4o");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn azure_request_omits_model() {
        let provider =
            OpenAIProvider::new(OpenAIConfig::azure("k", "https://res.openai.azure.com", "v")).unwrap();
        let body = serde_json::to_value(provider.to_openai_request(&request())).unwrap();
        assert!(body.get("model").is_none());
    }

    #[test]
    fn json_schema_format_is_strict() {
        let format = ResponseFormat::json_schema("it_helpdesk", json!({"type": "object"}));
        let value = response_format_json(&format).unwrap();
        assert_eq!(value["type"], "json_schema");
        assert_eq!(value["json_schema"]["name"], "it_helpdesk");
        assert_eq!(value["json_schema"]["strict"], true);
    }

    #[test]
    fn json_object_format() {
        assert_eq!(
            response_format_json(&ResponseFormat::JsonObject),
            Some(json!({"type": "json_object"}))
        );
        assert_eq!(response_format_json(&ResponseFormat::Text), None);
    }

    #[test]
    fn provider_info_reports_structured_output() {
        let provider = OpenAIProvider::new(OpenAIConfig::new("k").with_model("gpt-4o")).unwrap();
        let info = provider.provider_info();
        assert_eq!(info.name, "openai");
        assert_eq!(info.max_context_tokens, 128_000);
        assert!(info.supports_structured_output);

        let azure = OpenAIProvider::new(OpenAIConfig::azure("k", "https://r", "v")).unwrap();
        assert_eq!(azure.provider_info().name, "azure_openai");
    }

    #[test]
    fn parse_retry_after_from_message() {
        let body = r#"{"error":{"message":"Rate limit reached. Please try again in 20s."}}"#;
        assert_eq!(parse_retry_after(body), 20);
    }

    #[test]
    fn parse_retry_after_default() {
        assert_eq!(parse_retry_after("not json"), 30);
    }

    #[test]
    fn refusal_message_deserializes() {
        let raw = r#"{"model":"gpt-4o","choices":[{"message":{"role":"assistant","content":null,"refusal":"I can't help"},"finish_reason":"stop"}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.refusal.is_some());
        assert!(parsed.choices[0].message.content.is_none());
    }
}
