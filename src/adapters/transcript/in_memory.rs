//! In-memory transcript source for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::ThreadId;
use crate::domain::transcript::Turn;
use crate::ports::{TranscriptSource, TranscriptSourceError};

/// Transcript source holding threads in a map.
#[derive(Debug, Default)]
pub struct InMemoryTranscriptSource {
    threads: RwLock<HashMap<ThreadId, Vec<Turn>>>,
}

impl InMemoryTranscriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a thread.
    pub fn insert(&self, thread_id: ThreadId, turns: Vec<Turn>) {
        self.threads
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(thread_id, turns);
    }

    pub fn with_thread(self, thread_id: ThreadId, turns: Vec<Turn>) -> Self {
        self.insert(thread_id, turns);
        self
    }

    pub fn len(&self) -> usize {
        self.threads
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TranscriptSource for InMemoryTranscriptSource {
    async fn fetch(&self, thread_id: &ThreadId) -> Result<Vec<Turn>, TranscriptSourceError> {
        self.threads
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(thread_id)
            .cloned()
            .ok_or_else(|| TranscriptSourceError::NotFound(thread_id.clone()))
    }
}
