//! Process-wide serialization of final mixes.
//!
//! One gate is created at the composition root and shared by every worker.
//! Only the final tier passes through it; immediate and quick mixes never
//! touch it. Acquisition waits without a timeout, but the wait may be
//! abandoned by dropping the `admit` future.

use std::sync::atomic::{AtomicUsize, Ordering};

use bedmix_core::{MixerError, MixerResult};
use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Debug)]
pub struct FinalMixGate {
    permit: Semaphore,
    /// Final mixes waiting for or holding the gate, across all sessions.
    queued: AtomicUsize,
    /// Final mixes currently holding the gate (0 or 1).
    admitted: AtomicUsize,
}

/// Held while a final mix runs; releases the gate on drop.
#[derive(Debug)]
pub struct FinalMixPass<'a> {
    gate: &'a FinalMixGate,
    _slot: QueueSlot<'a>,
    _permit: SemaphorePermit<'a>,
}

/// One entry in the queued count, released on drop.
#[derive(Debug)]
struct QueueSlot<'a>(&'a FinalMixGate);

impl<'a> QueueSlot<'a> {
    fn take(gate: &'a FinalMixGate) -> Self {
        gate.queued.fetch_add(1, Ordering::SeqCst);
        Self(gate)
    }
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.queued.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FinalMixGate {
    pub const fn new() -> Self {
        Self {
            permit: Semaphore::const_new(1),
            queued: AtomicUsize::new(0),
            admitted: AtomicUsize::new(0),
        }
    }

    /// Wait for the gate. The returned pass must be held for the whole mix.
    pub async fn admit(&self) -> MixerResult<FinalMixPass<'_>> {
        let slot = QueueSlot::take(self);
        let permit = self
            .permit
            .acquire()
            .await
            .map_err(|e| MixerError::internal(format!("final mix gate closed: {e}")))?;
        self.admitted.fetch_add(1, Ordering::SeqCst);
        Ok(FinalMixPass {
            gate: self,
            _slot: slot,
            _permit: permit,
        })
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::SeqCst)
    }
}

impl Default for FinalMixGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FinalMixPass<'_> {
    fn drop(&mut self) {
        self.gate.admitted.fetch_sub(1, Ordering::SeqCst);
    }
}
