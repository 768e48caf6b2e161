//! Track queue state.
//!
//! Pure state machine for the per-kind pools of unplayed item ids. No I/O is
//! performed here; the assembler resolves playlists and feeds the results in
//! while holding the session lock.
//!
//! # Design
//!
//! - Pure synchronous state (no async, no IO, no tracing)
//! - Shuffling takes the RNG as a parameter so tests stay deterministic
//! - Front of the queue is the next item to play

use std::collections::VecDeque;

use bedmix_core::TrackKind;
use rand::Rng;
use rand::seq::SliceRandom;

/// A refill is attempted when a queue holds fewer items than this.
pub const LOW_WATER_MARK: usize = 10;

/// Maximum ids requested from the source per refill.
pub const REFILL_BATCH: usize = 50;

/// Ordered pool of unconsumed item ids for one track kind.
///
/// This is a sync type with no internal locking; the caller is responsible
/// for synchronization.
#[derive(Debug, Default)]
pub struct TrackQueue {
    items: VecDeque<String>,
}

impl TrackQueue {
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the queue has dropped below the low-water mark.
    pub fn needs_refill(&self) -> bool {
        self.items.len() < LOW_WATER_MARK
    }

    /// Shuffle a freshly resolved batch and append it.
    ///
    /// Returns the number of ids added.
    pub fn extend_shuffled<R>(&mut self, mut batch: Vec<String>, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        batch.shuffle(rng);
        let added = batch.len();
        self.items.extend(batch);
        added
    }

    /// Remove and return the head item.
    pub fn pop_front(&mut self) -> Option<String> {
        self.items.pop_front()
    }

    /// Put an item back at the head so it is the next one used.
    pub fn requeue_front(&mut self, item: String) {
        self.items.push_front(item);
    }

    #[cfg(test)]
    pub fn front(&self) -> Option<&str> {
        self.items.front().map(String::as_str)
    }
}

/// The music and speech queues of one session.
#[derive(Debug, Default)]
pub struct TrackQueues {
    music: TrackQueue,
    speech: TrackQueue,
}

impl TrackQueues {
    pub const fn get(&self, kind: TrackKind) -> &TrackQueue {
        match kind {
            TrackKind::Music => &self.music,
            TrackKind::Speech => &self.speech,
        }
    }

    pub const fn get_mut(&mut self, kind: TrackKind) -> &mut TrackQueue {
        match kind {
            TrackKind::Music => &mut self.music,
            TrackKind::Speech => &mut self.speech,
        }
    }
}
