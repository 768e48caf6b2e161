//! Mutable per-session state.
//!
//! Everything here is guarded by the session's single lock. Methods are
//! synchronous and perform no I/O; callers delete files after the state has
//! stopped referencing them.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use bedmix_core::{
    ChunkDescriptor, ErrorEntry, MixStage, MixTier, MixerError, ProgressRecord,
    STATUS_ERROR_COUNT, SessionId, TrackKind, WorkerStatus,
};

use super::error_log::ErrorLog;
use crate::queue::TrackQueues;

/// Answer to a tier upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The chunk now points at the new file; the old file can be removed.
    Applied,
    /// The chunk is gone (consumed or worker stopped); the new file is unused.
    Retired,
}

/// Result of promoting the next prepared chunk.
#[derive(Debug)]
pub struct Promotion {
    /// Chunk that was playing before, whose file should be deleted.
    pub outgoing: Option<ChunkDescriptor>,
    pub current: ChunkDescriptor,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) queues: TrackQueues,
    pub(crate) lookahead: VecDeque<ChunkDescriptor>,
    pub(crate) current: Option<ChunkDescriptor>,
    /// Index of the current chunk, or the last index produced before this
    /// worker started when nothing has played yet.
    pub(crate) chunk_index: u64,
    pub(crate) progress: BTreeMap<u64, ProgressRecord>,
    pub(crate) errors: ErrorLog,
    /// Chunks whose final mix is waiting at the gate or running.
    pub(crate) final_in_flight: BTreeSet<u64>,
    /// Set once the worker stops; later upgrades are ignored.
    pub(crate) retired: bool,
}

impl SessionState {
    /// State whose first produced chunk will be `base_index + 1`.
    pub fn starting_after(base_index: u64) -> Self {
        Self {
            chunk_index: base_index,
            ..Self::default()
        }
    }

    /// Index of the next chunk to prepare.
    pub fn next_index(&self) -> u64 {
        self.chunk_index + self.lookahead.len() as u64 + 1
    }

    pub fn set_progress(&mut self, index: u64, stage: MixStage, percent: u8) {
        self.progress
            .insert(index, ProgressRecord::new(stage, percent));
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(ErrorEntry::now(message));
    }

    /// Promote the head of the lookahead buffer if nothing is playing yet.
    pub fn promote_if_idle(&mut self) -> Option<ChunkDescriptor> {
        if self.current.is_none() {
            let head = self.lookahead.pop_front()?;
            self.chunk_index = head.index;
            self.current = Some(head);
        }
        self.current.clone()
    }

    /// Replace the current chunk with the head of the lookahead buffer.
    ///
    /// Leaves the state untouched and fails with `NoChunkAvailable` when the
    /// buffer is empty.
    pub fn advance(&mut self) -> Result<Promotion, MixerError> {
        let next = self
            .lookahead
            .pop_front()
            .ok_or(MixerError::NoChunkAvailable)?;

        let outgoing = self.current.replace(next.clone());
        self.chunk_index = next.index;
        self.progress.retain(|&index, _| index >= next.index);

        Ok(Promotion {
            outgoing,
            current: next,
        })
    }

    /// Point chunk `index` at `to` if it still stands on `from`.
    ///
    /// Checks the current chunk first, then the lookahead buffer. Tiers only
    /// move forward.
    pub fn apply_upgrade(&mut self, index: u64, tier: MixTier, from: &Path, to: &Path) -> SwapOutcome {
        if self.retired {
            return SwapOutcome::Retired;
        }

        let slot = self
            .current
            .iter_mut()
            .chain(self.lookahead.iter_mut())
            .find(|c| c.index == index && c.path == from && c.quality < tier);

        match slot {
            Some(chunk) => {
                chunk.path = to.to_path_buf();
                chunk.quality = tier;
                SwapOutcome::Applied
            }
            None => SwapOutcome::Retired,
        }
    }

    pub fn snapshot(&self, session_id: &SessionId, running: bool) -> WorkerStatus {
        let floor = self.current.as_ref().map_or(0, |c| c.index);
        WorkerStatus {
            session_id: session_id.clone(),
            running,
            chunk_index: self.chunk_index,
            current: self.current.clone(),
            lookahead_count: self.lookahead.len(),
            music_queue_len: self.queues.get(TrackKind::Music).len(),
            speech_queue_len: self.queues.get(TrackKind::Speech).len(),
            progress: self
                .progress
                .range(floor..)
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
            final_in_flight: self.final_in_flight.iter().copied().collect(),
            recent_errors: self.errors.recent(STATUS_ERROR_COUNT),
        }
    }
}
