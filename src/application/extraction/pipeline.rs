//! Extraction pipeline: normalize, generate, validate, repair.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use super::extractor::{Candidate, ConstrainedExtractor, GenerationConfig};
use crate::domain::extraction::{
    ExtractionFailure, ExtractionOutcome, ExtractionRun, ExtractionState, FailureReason,
    GenerationError, ParseError, PromptTemplate, ResponseParser, ResultRecord,
};
use crate::domain::foundation::{RunId, ThreadId, ValidationError};
use crate::domain::schema::{FieldError, Schema, SchemaRegistry, UnknownFieldPolicy};
use crate::domain::transcript::{normalize, MalformedTranscriptError, Transcript, TurnRole};
use crate::ports::{AIProvider, RequestMetadata};

/// Per-pipeline extraction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSettings {
    pub domain: String,
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub timeout: Duration,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub unknown_fields: UnknownFieldPolicy,
}

impl ExtractionSettings {
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            domain: crate::domain::schema::helpdesk::DOMAIN.to_string(),
            max_attempts: 3,
            timeout: generation.timeout,
            max_output_tokens: generation.max_output_tokens,
            temperature: generation.temperature,
            unknown_fields: UnknownFieldPolicy::Ignore,
        }
    }
}

/// Errors raised instead of an outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The transcript cannot be normalized; no call was made.
    #[error(transparent)]
    MalformedTranscript(#[from] MalformedTranscriptError),

    #[error("No schema registered for domain '{0}'")]
    UnknownDomain(String),

    /// The repair loop attempted an illegal state transition.
    #[error("Extraction run entered an invalid state: {0}")]
    InvalidState(#[from] ValidationError),
}

/// Runs the bounded extract-validate-repair loop for one schema domain.
pub struct ExtractionPipeline {
    schema: Arc<Schema>,
    template: PromptTemplate,
    extractor: ConstrainedExtractor,
    parser: ResponseParser,
    settings: ExtractionSettings,
}

impl ExtractionPipeline {
    /// Resolves the settings' domain in `registry`.
    pub fn new(
        registry: &SchemaRegistry,
        provider: Arc<dyn AIProvider>,
        settings: ExtractionSettings,
    ) -> Result<Self, PipelineError> {
        let schema = registry
            .schema(&settings.domain)
            .ok_or_else(|| PipelineError::UnknownDomain(settings.domain.clone()))?;

        Ok(Self {
            template: PromptTemplate::for_domain(schema.domain()),
            extractor: ConstrainedExtractor::new(provider, settings.generation_config()),
            parser: ResponseParser::new(),
            schema,
            settings,
        })
    }

    /// Replaces the domain's built-in prompt wording.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Extracts a record from one transcript.
    ///
    /// A failed run is returned as [`ExtractionOutcome::Failed`]; only a
    /// malformed transcript (or a broken loop) is an `Err`.
    pub async fn extract(&self, transcript: &Transcript) -> Result<ExtractionOutcome, PipelineError> {
        self.run(transcript, None, None).await
    }

    /// Like [`extract`](Self::extract), stopping before the next call once
    /// `cancel` reads `true`. An in-flight call is allowed to finish.
    pub async fn extract_with_cancel(
        &self,
        transcript: &Transcript,
        cancel: watch::Receiver<bool>,
    ) -> Result<ExtractionOutcome, PipelineError> {
        self.run(transcript, None, Some(cancel)).await
    }

    /// Extracts with the thread id attached to every request for tracing.
    pub async fn extract_thread(
        &self,
        thread_id: &ThreadId,
        transcript: &Transcript,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<ExtractionOutcome, PipelineError> {
        self.run(transcript, Some(thread_id), cancel).await
    }

    async fn run(
        &self,
        transcript: &Transcript,
        thread_id: Option<&ThreadId>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<ExtractionOutcome, PipelineError> {
        let canonical = normalize(transcript)?;
        let domain = self.schema.domain();
        let mut run = ExtractionRun::new(RunId::new(), self.settings.max_attempts);

        tracing::info!(
            run_id = %run.run_id(),
            domain,
            turns = transcript.len(),
            user_turns = transcript.count_by_role(TurnRole::User),
            agent_turns = transcript.count_by_role(TurnRole::Agent),
            max_attempts = run.max_attempts(),
            "Starting extraction"
        );

        loop {
            if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
                run.cancel()?;
                tracing::warn!(run_id = %run.run_id(), attempts = run.attempt_count(), "Extraction cancelled");
                return Ok(self.failure(run, FailureReason::Cancelled));
            }

            let attempt = run.next_attempt_number();
            let mut metadata = RequestMetadata::new(run.run_id(), attempt);
            if let Some(thread_id) = thread_id {
                metadata = metadata.with_thread(thread_id.clone());
            }

            let feedback = run.feedback();
            let generated = self
                .extractor
                .generate(&canonical, &self.schema, &self.template, feedback.as_ref(), metadata)
                .await;

            let next = match generated {
                Ok(candidate) => {
                    let raw = candidate.raw();
                    match self.parse(candidate) {
                        Err(ParseError::Empty) => {
                            self.generation_failed(&mut run, GenerationError::Empty)?
                        }
                        Err(err) => {
                            run.begin_validation()?;
                            let errors = vec![FieldError::unparseable(err.to_string())];
                            self.rejected(&mut run, raw, errors)?
                        }
                        Ok(value) => {
                            run.begin_validation()?;
                            match self.schema.conform(&value, self.settings.unknown_fields) {
                                Ok(conformed) => {
                                    if !conformed.ignored_fields.is_empty() {
                                        tracing::debug!(
                                            run_id = %run.run_id(),
                                            attempt,
                                            ignored = ?conformed.ignored_fields,
                                            "Dropped undeclared fields"
                                        );
                                    }
                                    run.record_success(Some(raw), conformed.ignored_fields)?;
                                    tracing::info!(
                                        run_id = %run.run_id(),
                                        attempt,
                                        domain,
                                        elapsed_ms = run.elapsed_ms(),
                                        "Extraction succeeded"
                                    );
                                    return Ok(ExtractionOutcome::Succeeded {
                                        run_id: run.run_id(),
                                        record: ResultRecord::new(domain, conformed.values),
                                        attempts: run.into_attempts(),
                                    });
                                }
                                Err(errors) => self.rejected(&mut run, raw, errors)?,
                            }
                        }
                    }
                }
                Err(err) => self.generation_failed(&mut run, err)?,
            };

            match next {
                ExtractionState::Retrying => run.resume()?,
                _ => return Ok(self.failure(run, FailureReason::AttemptsExhausted)),
            }
        }
    }

    fn parse(&self, candidate: Candidate) -> Result<serde_json::Value, ParseError> {
        match candidate {
            Candidate::Structured(value) => Ok(value),
            Candidate::Text(text) => self.parser.parse(&text),
        }
    }

    fn rejected(
        &self,
        run: &mut ExtractionRun,
        raw: String,
        errors: Vec<FieldError>,
    ) -> Result<ExtractionState, ValidationError> {
        tracing::warn!(
            run_id = %run.run_id(),
            attempt = run.next_attempt_number(),
            errors = errors.len(),
            first_error = %errors.first().map(ToString::to_string).unwrap_or_default(),
            "Candidate failed validation"
        );
        run.record_rejection(Some(raw), errors)
    }

    fn generation_failed(
        &self,
        run: &mut ExtractionRun,
        error: GenerationError,
    ) -> Result<ExtractionState, ValidationError> {
        tracing::warn!(
            run_id = %run.run_id(),
            attempt = run.next_attempt_number(),
            error = %error,
            "Generation failed"
        );
        let errors = match error {
            GenerationError::Empty => vec![FieldError::empty_output(self.schema.required_fields())],
            GenerationError::Unavailable { .. } => Vec::new(),
        };
        run.record_generation_failure(error, errors)
    }

    fn failure(&self, run: ExtractionRun, reason: FailureReason) -> ExtractionOutcome {
        let run_id = run.run_id();
        if reason == FailureReason::AttemptsExhausted {
            tracing::warn!(
                run_id = %run_id,
                attempts = run.attempt_count(),
                elapsed_ms = run.elapsed_ms(),
                "Extraction failed"
            );
        }
        ExtractionOutcome::Failed(ExtractionFailure {
            run_id,
            domain: self.schema.domain().to_string(),
            reason,
            attempts: run.into_attempts(),
        })
    }
}
