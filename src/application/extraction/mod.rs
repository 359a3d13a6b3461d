//! Extraction use case: the constrained extractor and the repair loop
//! that drives it.

mod extractor;
mod pipeline;

pub use extractor::{Candidate, ConstrainedExtractor, GenerationConfig};
pub use pipeline::{ExtractionPipeline, ExtractionSettings, PipelineError};
