//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Scriptable mock for testing
//! - `OpenAIProvider` - OpenAI and Azure OpenAI chat completions, with
//!   strict JSON Schema output
//! - `AnthropicProvider` - Anthropic Claude models (free-text output)

mod anthropic_provider;
mod mock_provider;
mod openai_provider;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIEndpoint, OpenAIProvider};
