//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Language model providers (OpenAI, Azure OpenAI, Anthropic, mock)
//! - `transcript` - Transcript sources (JSON-lines files, in-memory)

pub mod ai;
pub mod transcript;

pub use ai::{
    AnthropicConfig, AnthropicProvider, MockAIProvider, MockError, OpenAIConfig, OpenAIProvider,
};
pub use transcript::{InMemoryTranscriptSource, JsonlTranscriptSource};
