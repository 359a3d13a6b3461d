//! JSON-lines transcript source.
//!
//! Reads `<dir>/<thread_id>.jsonl`, one message per line:
//!
//! ```text
//! {"role": "user", "content": "My authenticator app is not working."}
//! {"role": "assistant", "content": "Are you able to open the app?"}
//! ```
//!
//! Lines are in conversation order. Blank lines and messages with no text
//! are skipped; sequence indices count the kept messages from zero.

use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::foundation::ThreadId;
use crate::domain::transcript::{Turn, TurnRole};
use crate::ports::{TranscriptSource, TranscriptSourceError};

#[derive(Debug, Deserialize)]
struct MessageLine {
    role: String,
    content: String,
}

/// Transcript source backed by a directory of `.jsonl` exports.
#[derive(Debug, Clone)]
pub struct JsonlTranscriptSource {
    dir: PathBuf,
}

impl JsonlTranscriptSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a thread's export file.
    pub fn path_for(&self, thread_id: &ThreadId) -> PathBuf {
        self.dir.join(format!("{}.jsonl", thread_id))
    }

    /// Parses the contents of one export file.
    pub fn parse(thread_id: &ThreadId, contents: &str) -> Result<Vec<Turn>, TranscriptSourceError> {
        let mut turns = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let invalid = |message: String| TranscriptSourceError::InvalidRecord {
                thread_id: thread_id.clone(),
                line: index + 1,
                message,
            };

            let message: MessageLine =
                serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;
            if message.content.trim().is_empty() {
                continue;
            }
            let role: TurnRole = message.role.parse().map_err(invalid)?;

            let turn = Turn::new(role, message.content.trim(), turns.len() as u64)
                .map_err(|e| invalid(e.to_string()))?;
            turns.push(turn);
        }

        Ok(turns)
    }
}

#[async_trait]
impl TranscriptSource for JsonlTranscriptSource {
    async fn fetch(&self, thread_id: &ThreadId) -> Result<Vec<Turn>, TranscriptSourceError> {
        let path = self.path_for(thread_id);
        tracing::debug!(thread_id = %thread_id, path = %path.display(), "Reading transcript");

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TranscriptSourceError::NotFound(thread_id.clone())
            } else {
                TranscriptSourceError::Io {
                    thread_id: thread_id.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        Self::parse(thread_id, &contents)
    }
}
