//! Mixing pipeline error types.
//!
//! Errors are cloneable and serializable so they can be stored in a worker's
//! error ring and reported through status without holding `std::io::Error`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{MixTier, TrackKind};

/// Result type for mixing operations.
pub type MixerResult<T> = Result<T, MixerError>;

/// Outcome of a failed transcode invocation.
///
/// `status` is the engine's exit code; `None` means it never exited normally
/// (spawn failure, signal, timeout).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeFailure {
    pub status: Option<i32>,
    pub detail: String,
}

impl TranscodeFailure {
    pub fn new(status: Option<i32>, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// The engine did not finish within `secs`.
    #[must_use]
    pub fn timeout(secs: u64) -> Self {
        Self::new(None, format!("timed out after {secs}s"))
    }
}

impl fmt::Display for TranscodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "exit status {code}: {}", self.detail),
            None => f.write_str(&self.detail),
        }
    }
}

impl std::error::Error for TranscodeFailure {}

/// Error type for the chunk production pipeline.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum MixerError {
    /// Playlist could not be resolved to item ids.
    #[error("Could not resolve playlist {playlist}: {message}")]
    ResolutionFailure { playlist: String, message: String },

    /// A single item could not be fetched.
    #[error("Fetch failed for {item_id}: {message}")]
    FetchFailure { item_id: String, message: String },

    /// A fetched file was missing or too small to be real audio.
    #[error("Corrupt download for {item_id} ({bytes} bytes)")]
    CorruptDownload { item_id: String, bytes: u64 },

    /// The queue stayed empty after a refill.
    #[error("No {kind} tracks left in queue")]
    QueueExhausted { kind: TrackKind },

    /// Collection finished without a single usable track.
    #[error("No usable {kind} tracks collected")]
    EmptyCollection { kind: TrackKind },

    /// Bed concatenation failed.
    #[error("Concatenation of {kind} bed failed: {failure}")]
    ConcatenationFailed {
        kind: TrackKind,
        failure: TranscodeFailure,
    },

    /// A mix tier failed or timed out.
    #[error("{tier} mix failed: {failure}")]
    MixFailed {
        tier: MixTier,
        failure: TranscodeFailure,
    },

    /// `advance` was called with nothing prepared.
    #[error("No chunk available yet")]
    NoChunkAvailable,

    /// Final tier intentionally skipped; the chunk stays at quick quality.
    #[error("Final mix for chunk {chunk} skipped: {in_flight} already in flight")]
    CapacitySkipped { chunk: u64, in_flight: usize },

    /// No session with this id exists on disk.
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Filesystem error.
    #[error("I/O error ({kind}): {message}")]
    Io { kind: String, message: String },

    /// The worker was stopped while the operation was under way.
    #[error("Worker stopped")]
    Stopped,

    /// Unexpected internal failure (task panicked, channel closed).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MixerError {
    /// Capture a `std::io::Error` as kind and message.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this is an intentional omission rather than a fault.
    #[must_use]
    pub const fn is_capacity_skip(&self) -> bool {
        matches!(self, Self::CapacitySkipped { .. })
    }

    /// Per-track failures are skipped by moving on to the next queue item.
    #[must_use]
    pub const fn is_per_track(&self) -> bool {
        matches!(
            self,
            Self::FetchFailure { .. } | Self::CorruptDownload { .. }
        )
    }
}

impl From<std::io::Error> for MixerError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}
