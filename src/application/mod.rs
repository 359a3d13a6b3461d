//! Application layer - Use cases that orchestrate domain logic through ports.

pub mod extraction;
pub mod handlers;

pub use extraction::{
    Candidate, ConstrainedExtractor, ExtractionPipeline, ExtractionSettings, GenerationConfig,
    PipelineError,
};
pub use handlers::{
    ExtractThreadCommand, ExtractThreadError, ExtractThreadHandler, ExtractThreadResult,
};
