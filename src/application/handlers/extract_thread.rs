//! ExtractThreadHandler - Fetches a thread and runs the extraction pipeline.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::application::extraction::{ExtractionPipeline, PipelineError};
use crate::domain::extraction::ExtractionOutcome;
use crate::domain::foundation::ThreadId;
use crate::domain::transcript::Transcript;
use crate::ports::{TranscriptSource, TranscriptSourceError};

/// Command to analyze one conversation thread.
#[derive(Debug, Clone)]
pub struct ExtractThreadCommand {
    pub thread_id: ThreadId,
}

/// Result of a handled command.
#[derive(Debug, Clone)]
pub struct ExtractThreadResult {
    pub thread_id: ThreadId,
    pub outcome: ExtractionOutcome,
}

#[derive(Debug, Error)]
pub enum ExtractThreadError {
    #[error("Failed to fetch transcript: {0}")]
    Source(#[from] TranscriptSourceError),

    #[error("Thread '{thread_id}' could not be extracted: {source}")]
    Pipeline {
        thread_id: ThreadId,
        #[source]
        source: PipelineError,
    },
}

/// Handler for thread extraction.
pub struct ExtractThreadHandler {
    source: Arc<dyn TranscriptSource>,
    pipeline: Arc<ExtractionPipeline>,
    cancel: Option<watch::Receiver<bool>>,
}

impl ExtractThreadHandler {
    pub fn new(source: Arc<dyn TranscriptSource>, pipeline: Arc<ExtractionPipeline>) -> Self {
        Self {
            source,
            pipeline,
            cancel: None,
        }
    }

    /// Stops starting new provider calls once `cancel` reads `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn handle(
        &self,
        cmd: ExtractThreadCommand,
    ) -> Result<ExtractThreadResult, ExtractThreadError> {
        // 1. Fetch turns
        let turns = self.source.fetch(&cmd.thread_id).await?;
        tracing::debug!(thread_id = %cmd.thread_id, turns = turns.len(), "Fetched transcript");

        // 2. Run the repair loop
        let transcript = Transcript::new(turns);
        let outcome = self
            .pipeline
            .extract_thread(&cmd.thread_id, &transcript, self.cancel.clone())
            .await
            .map_err(|source| ExtractThreadError::Pipeline {
                thread_id: cmd.thread_id.clone(),
                source,
            })?;

        Ok(ExtractThreadResult {
            thread_id: cmd.thread_id,
            outcome,
        })
    }

    /// Handles many threads with at most `concurrency` in flight.
    ///
    /// Results come back in completion order, one per command.
    pub async fn handle_batch(
        &self,
        commands: Vec<ExtractThreadCommand>,
        concurrency: usize,
    ) -> Vec<Result<ExtractThreadResult, ExtractThreadError>> {
        stream::iter(commands)
            .map(|cmd| self.handle(cmd))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::transcript::InMemoryTranscriptSource;
    use crate::application::extraction::ExtractionSettings;
    use crate::domain::schema::{FieldSpec, Schema, SchemaRegistry};
    use crate::domain::transcript::{MalformedTranscriptError, Turn, TurnRole};
    use serde_json::json;

    fn pipeline(mock: &MockAIProvider) -> Arc<ExtractionPipeline> {
        let registry = SchemaRegistry::builder()
            .register(
                Schema::builder("support_call")
                    .field(FieldSpec::boolean("first_call_resolution"))
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .build();
        Arc::new(
            ExtractionPipeline::new(
                &registry,
                Arc::new(mock.clone()),
                ExtractionSettings::for_domain("support_call"),
            )
            .unwrap(),
        )
    }

    fn thread(id: &str) -> ThreadId {
        ThreadId::new(id).unwrap()
    }

    fn source() -> InMemoryTranscriptSource {
        let turns = vec![
            Turn::new(TurnRole::User, "Password reset please", 0).unwrap(),
            Turn::new(TurnRole::Agent, "Done, check your email.", 1).unwrap(),
        ];
        InMemoryTranscriptSource::new()
            .with_thread(thread("a"), turns.clone())
            .with_thread(thread("b"), turns)
            .with_thread(thread("empty"), Vec::new())
    }

    #[tokio::test]
    async fn handle_extracts_fetched_thread() {
        let mock = MockAIProvider::new().with_fallback(json!({"first_call_resolution": true}).to_string());
        let handler = ExtractThreadHandler::new(Arc::new(source()), pipeline(&mock));

        let result = handler
            .handle(ExtractThreadCommand { thread_id: thread("a") })
            .await
            .unwrap();

        assert_eq!(result.thread_id, thread("a"));
        let record = result.outcome.record().unwrap();
        assert!(record.require_bool("first_call_resolution").unwrap());
    }

    #[tokio::test]
    async fn missing_thread_is_source_error() {
        let mock = MockAIProvider::new();
        let handler = ExtractThreadHandler::new(Arc::new(source()), pipeline(&mock));

        let err = handler
            .handle(ExtractThreadCommand { thread_id: thread("zzz") })
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractThreadError::Source(TranscriptSourceError::NotFound(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_thread_is_malformed() {
        let mock = MockAIProvider::new();
        let handler = ExtractThreadHandler::new(Arc::new(source()), pipeline(&mock));

        let err = handler
            .handle(ExtractThreadCommand { thread_id: thread("empty") })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractThreadError::Pipeline {
                source: PipelineError::MalformedTranscript(MalformedTranscriptError::Empty),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn batch_returns_one_result_per_command() {
        let mock = MockAIProvider::new().with_fallback(json!({"first_call_resolution": false}).to_string());
        let handler = ExtractThreadHandler::new(Arc::new(source()), pipeline(&mock));

        let results = handler
            .handle_batch(
                vec![
                    ExtractThreadCommand { thread_id: thread("a") },
                    ExtractThreadCommand { thread_id: thread("b") },
                    ExtractThreadCommand { thread_id: thread("missing") },
                ],
                2,
            )
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
        assert_eq!(mock.call_count(), 2);
    }
}
