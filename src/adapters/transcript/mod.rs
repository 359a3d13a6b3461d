//! Transcript Source Adapters.
//!
//! - `JsonlTranscriptSource` - one `.jsonl` export per thread in a directory
//! - `InMemoryTranscriptSource` - threads held in memory

mod in_memory;
mod jsonl_source;

pub use in_memory::InMemoryTranscriptSource;
pub use jsonl_source::JsonlTranscriptSource;
