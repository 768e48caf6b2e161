//! Worker status snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{ChunkDescriptor, MixTier, ProgressRecord, SessionId};

/// Number of error entries included in a status snapshot.
pub const STATUS_ERROR_COUNT: usize = 5;

/// One timestamped entry of a worker's error ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl ErrorEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

/// Point-in-time view of a chunk worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub session_id: SessionId,
    pub running: bool,
    /// Index of the chunk now playing (0 before the first promotion).
    pub chunk_index: u64,
    pub current: Option<ChunkDescriptor>,
    pub lookahead_count: usize,
    pub music_queue_len: usize,
    pub speech_queue_len: usize,
    /// Progress of chunks not yet consumed, by index.
    pub progress: BTreeMap<u64, ProgressRecord>,
    /// Chunk indices whose final mix is queued or running.
    pub final_in_flight: Vec<u64>,
    /// Most recent errors, oldest first.
    pub recent_errors: Vec<ErrorEntry>,
}

impl WorkerStatus {
    #[must_use]
    pub fn current_quality(&self) -> Option<MixTier> {
        self.current.as_ref().map(|c| c.quality)
    }
}
