//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - One completion call to a language model
//! - `TranscriptSource` - Ordered turns of a conversation thread

mod ai_provider;
mod transcript_source;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, ResponseFormat, TokenUsage,
};
pub use transcript_source::{TranscriptSource, TranscriptSourceError};
