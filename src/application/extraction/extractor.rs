//! Constrained extractor: one provider call per invocation.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::extraction::{repair_message, GenerationError, PromptTemplate, RepairFeedback};
use crate::domain::schema::Schema;
use crate::ports::{
    AIProvider, CompletionRequest, FinishReason, Message, RequestMetadata, ResponseFormat,
};

/// What one generation call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// The provider honored the JSON schema and returned a parsed object.
    Structured(Value),
    /// Free text that still has to be located and parsed.
    Text(String),
}

impl Candidate {
    /// The candidate as text, kept on the attempt for feedback and audit.
    pub fn raw(&self) -> String {
        match self {
            Candidate::Structured(value) => value.to_string(),
            Candidate::Text(text) => text.clone(),
        }
    }
}

/// Generation knobs passed on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    /// Determinism hint; 0.0 unless configured otherwise.
    pub temperature: f32,
    /// Upper bound on a single provider call.
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 4096,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Asks a language model for a candidate object matching a schema.
///
/// Providers that advertise structured output get the schema as a strict
/// `json_schema` response format; others get the instruction text only and
/// answer in free text. The extractor never retries; that is the repair
/// loop's job.
pub struct ConstrainedExtractor {
    provider: Arc<dyn AIProvider>,
    config: GenerationConfig,
}

impl ConstrainedExtractor {
    pub fn new(provider: Arc<dyn AIProvider>, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Builds the request for one attempt.
    ///
    /// With feedback, the previous answer is replayed as an assistant turn
    /// and followed by a user turn listing every field error.
    pub fn build_request(
        &self,
        canonical_text: &str,
        schema: &Schema,
        template: &PromptTemplate,
        feedback: Option<&RepairFeedback>,
        metadata: RequestMetadata,
    ) -> CompletionRequest {
        let response_format = if self.provider.provider_info().supports_structured_output {
            ResponseFormat::json_schema(schema.domain(), schema.json_schema())
        } else {
            ResponseFormat::Text
        };

        let mut request = CompletionRequest::new(metadata)
            .with_system_prompt(template.system_prompt(schema))
            .with_max_tokens(self.config.max_output_tokens)
            .with_temperature(self.config.temperature)
            .with_response_format(response_format);
        request.messages.push(Message::user(template.user_prompt(canonical_text)));

        if let Some(feedback) = feedback {
            if let Some(previous) = &feedback.previous_output {
                request.messages.push(Message::assistant(previous.clone()));
            }
            request.messages.push(Message::user(repair_message(feedback)));
        }

        request
    }

    /// Performs exactly one provider call.
    pub async fn generate(
        &self,
        canonical_text: &str,
        schema: &Schema,
        template: &PromptTemplate,
        feedback: Option<&RepairFeedback>,
        metadata: RequestMetadata,
    ) -> Result<Candidate, GenerationError> {
        let request = self.build_request(canonical_text, schema, template, feedback, metadata);
        let structured = request.response_format.expects_json();

        let response = tokio::time::timeout(self.config.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                GenerationError::unavailable(format!(
                    "Provider call timed out after {:?}",
                    self.config.timeout
                ))
            })?
            .map_err(|e| {
                tracing::debug!(error = %e, retryable = e.is_retryable(), "Provider call failed");
                GenerationError::unavailable(e.to_string())
            })?;

        if response.finish_reason == FinishReason::Length {
            tracing::warn!(
                max_output_tokens = self.config.max_output_tokens,
                completion_tokens = response.usage.completion_tokens,
                "Provider output was truncated"
            );
        }

        let content = response.content;
        if content.trim().is_empty() {
            return Err(GenerationError::Empty);
        }

        if structured {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(content.trim()) {
                return Ok(Candidate::Structured(value));
            }
        }
        Ok(Candidate::Text(content))
    }
}
