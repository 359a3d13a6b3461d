//! Transcript Source Port - where conversation turns come from.
//!
//! Retrieval is outside the extraction core; this port only promises an
//! ordered list of turns for a thread, oldest first, with sequence indices
//! assigned in arrival order.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ThreadId;
use crate::domain::transcript::Turn;

/// Port for fetching a thread's turns.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Returns the thread's turns in conversation order.
    async fn fetch(&self, thread_id: &ThreadId) -> Result<Vec<Turn>, TranscriptSourceError>;
}

/// Transcript retrieval errors.
#[derive(Debug, Error)]
pub enum TranscriptSourceError {
    #[error("thread not found: {0}")]
    NotFound(ThreadId),

    #[error("failed to read thread {thread_id}: {message}")]
    Io { thread_id: ThreadId, message: String },

    #[error("thread {thread_id} line {line}: {message}")]
    InvalidRecord {
        thread_id: ThreadId,
        line: usize,
        message: String,
    },
}
