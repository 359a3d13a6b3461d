//! transcript-analytics - Command line entry point
//!
//! Fetches one or more threads from the JSON-lines transcript directory,
//! extracts a record for each and writes the records as JSON.

use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use transcript_analytics::adapters::ai::{
    AnthropicConfig, AnthropicProvider, OpenAIConfig, OpenAIProvider,
};
use transcript_analytics::adapters::transcript::JsonlTranscriptSource;
use transcript_analytics::application::{
    ExtractThreadCommand, ExtractThreadHandler, ExtractionPipeline, ExtractionSettings,
};
use transcript_analytics::config::{AiConfig, AiProvider, AppConfig, LogFormat};
use transcript_analytics::domain::extraction::ExtractionOutcome;
use transcript_analytics::domain::foundation::ThreadId;
use transcript_analytics::domain::schema::SchemaRegistry;
use transcript_analytics::ports::{AIError, AIProvider};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "transcript-analytics")]
#[command(about = "Extract structured analytics from conversation transcripts")]
#[command(version)]
struct Args {
    /// Thread ids to analyze
    #[arg(required = true)]
    thread_ids: Vec<ThreadId>,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Schema domain, overriding configuration
    #[arg(short, long)]
    domain: Option<String>,

    /// Attempt budget per thread, overriding configuration
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Directory of `<thread_id>.jsonl` exports, overriding configuration
    #[arg(long, env = "TRANSCRIPT_ANALYTICS_DIR")]
    transcripts_dir: Option<PathBuf>,

    /// Threads processed concurrently
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(domain) = args.domain.clone() {
        config.extraction.domain = domain;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.extraction.max_attempts = max_attempts;
    }
    if let Some(dir) = args.transcripts_dir.clone() {
        config.extraction.transcripts_dir = dir;
    }

    init_tracing(config.logging.format);
    config.validate()?;

    let registry = SchemaRegistry::with_builtin()?;
    let provider = build_provider(&config.ai)?;
    let info = provider.provider_info();
    tracing::info!(
        provider = %info.name,
        model = %info.model,
        domain = %config.extraction.domain,
        threads = args.thread_ids.len(),
        "Starting transcript analytics"
    );

    let settings = ExtractionSettings {
        domain: config.extraction.domain.clone(),
        max_attempts: config.extraction.max_attempts,
        timeout: config.ai.timeout(),
        max_output_tokens: config.ai.max_output_tokens,
        temperature: config.ai.temperature,
        unknown_fields: config.extraction.unknown_fields,
    };
    let pipeline = Arc::new(ExtractionPipeline::new(&registry, provider, settings)?);
    let source = Arc::new(JsonlTranscriptSource::new(&config.extraction.transcripts_dir));

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, finishing in-flight calls");
            let _ = cancel_tx.send(true);
        }
    });

    let handler = ExtractThreadHandler::new(source, pipeline).with_cancellation(cancel_rx);
    let single = args.thread_ids.len() == 1;
    let commands = args
        .thread_ids
        .into_iter()
        .map(|thread_id| ExtractThreadCommand { thread_id })
        .collect();

    let mut records = BTreeMap::new();
    let mut failed = 0usize;
    for result in handler.handle_batch(commands, args.concurrency).await {
        match result {
            Ok(handled) => match handled.outcome {
                ExtractionOutcome::Succeeded { record, attempts, .. } => {
                    tracing::info!(
                        thread_id = %handled.thread_id,
                        attempts = attempts.len(),
                        "Thread extracted"
                    );
                    records.insert(handled.thread_id.to_string(), record.to_json());
                }
                ExtractionOutcome::Failed(failure) => {
                    failed += 1;
                    tracing::error!(
                        thread_id = %handled.thread_id,
                        reason = %failure.reason,
                        last_errors = ?failure.last_field_errors(),
                        "{}",
                        failure
                    );
                }
            },
            Err(err) => {
                failed += 1;
                tracing::error!(error = %err, "Thread could not be processed");
            }
        }
    }

    let document = if single {
        records.into_values().next()
    } else {
        Some(serde_json::to_value(records)?)
    };
    if let Some(document) = document {
        let json = serde_json::to_string_pretty(&document)?;
        match &args.output {
            Some(path) => tokio::fs::write(path, json + "\n").await?,
            None => println!("{}", json),
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "transcript_analytics=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn build_provider(config: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    let provider: Arc<dyn AIProvider> = match config.provider {
        AiProvider::OpenAI => {
            let key = config.openai_api_key.clone().unwrap_or_default();
            let mut provider_config = OpenAIConfig::new(key).with_timeout(config.timeout());
            if let Some(model) = &config.model {
                provider_config = provider_config.with_model(model);
            }
            if let Some(url) = &config.base_url {
                provider_config = provider_config.with_base_url(url);
            }
            Arc::new(OpenAIProvider::new(provider_config)?)
        }
        AiProvider::AzureOpenAI => {
            let provider_config = OpenAIConfig::azure(
                config.azure_api_key.clone().unwrap_or_default(),
                config.azure_endpoint.clone().unwrap_or_default(),
                config.azure_api_version.clone(),
            )
            .with_model(config.model.clone().unwrap_or_default())
            .with_timeout(config.timeout());
            Arc::new(OpenAIProvider::new(provider_config)?)
        }
        AiProvider::Anthropic => {
            let key = config.anthropic_api_key.clone().unwrap_or_default();
            let mut provider_config = AnthropicConfig::new(key).with_timeout(config.timeout());
            if let Some(model) = &config.model {
                provider_config = provider_config.with_model(model);
            }
            if let Some(url) = &config.base_url {
                provider_config = provider_config.with_base_url(url);
            }
            Arc::new(AnthropicProvider::new(provider_config)?)
        }
    };
    Ok(provider)
}
