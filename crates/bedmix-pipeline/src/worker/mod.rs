//! Per-session chunk worker.
//!
//! The worker keeps a lookahead buffer of prepared chunks topped up from a
//! background loop and exposes the current chunk to the streaming boundary.
//!
//! # Concurrency Model
//!
//! - One background loop task per worker (`start` is idempotent)
//! - One applier task that owns every chunk reference swap
//! - One detached upgrade task per prepared chunk
//! - Stop is cooperative: in-flight transcodes are allowed to finish
//! - Every task above is tracked, so a stopped worker can be awaited until
//!   nothing of it touches the session's files any more

pub(crate) mod applier;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bedmix_core::{
    ChunkDescriptor, MixStage, MixTier, MixerError, MixerResult, SessionId, TrackSourcePort,
    TranscoderPort, WorkerStatus,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::assembler::{ChunkAssembler, remove_quietly};
use crate::config::PipelineConfig;
use crate::gate::FinalMixGate;
use crate::mixer::{MixUpgrader, UpgradeReport, UpgradeSender};
use crate::session::SessionContext;

/// Shared dependencies injected into every worker.
#[derive(Clone)]
pub struct WorkerDeps {
    pub source: Arc<dyn TrackSourcePort>,
    pub transcoder: Arc<dyn TranscoderPort>,
    /// Process-wide gate shared by all workers.
    pub gate: Arc<FinalMixGate>,
    pub config: Arc<PipelineConfig>,
}

/// A chunk that reached immediate quality, with its running upgrade.
#[derive(Debug)]
pub struct PreparedChunk {
    pub descriptor: ChunkDescriptor,
    pub upgrade: JoinHandle<UpgradeReport>,
}

pub struct ChunkWorker {
    ctx: Arc<SessionContext>,
    assembler: ChunkAssembler,
    upgrader: Arc<MixUpgrader>,
    config: Arc<PipelineConfig>,
    swaps: UpgradeSender,
    cancel: CancellationToken,
    tasks: TaskTracker,
    loop_started: AtomicBool,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for ChunkWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkWorker")
            .field("session", self.ctx.id())
            .field("running", &self.is_running())
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl ChunkWorker {
    /// Create a worker for `ctx` and start its applier.
    ///
    /// The background loop is not started; call [`ChunkWorker::start`].
    pub fn new(ctx: Arc<SessionContext>, deps: &WorkerDeps) -> Arc<Self> {
        let cancel = CancellationToken::new();
        let assembler = ChunkAssembler::new(
            Arc::clone(&ctx),
            Arc::clone(&deps.source),
            Arc::clone(&deps.transcoder),
            Arc::clone(&deps.config),
        )
        .with_cancellation(cancel.clone());
        let upgrader = Arc::new(
            MixUpgrader::new(
                Arc::clone(&ctx),
                Arc::clone(&deps.transcoder),
                Arc::clone(&deps.gate),
                Arc::clone(&deps.config),
            )
            .with_cancellation(cancel.clone()),
        );

        let tasks = TaskTracker::new();
        let (swaps, upgrades) = mpsc::unbounded_channel();
        tasks.spawn(applier::run(Arc::clone(&ctx), upgrades, cancel.clone()));

        Arc::new(Self {
            ctx,
            assembler,
            upgrader,
            config: Arc::clone(&deps.config),
            swaps,
            cancel,
            tasks,
            loop_started: AtomicBool::new(false),
            loop_handle: Mutex::new(None),
        })
    }

    pub fn session_id(&self) -> &SessionId {
        self.ctx.id()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Start the background loop.
    ///
    /// This method is idempotent: calling it multiple times has no effect
    /// after the first call.
    pub async fn start(self: &Arc<Self>) {
        if self
            .loop_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let worker = Arc::clone(self);
            let handle = self.tasks.spawn(async move { worker.run_loop().await });
            *self.loop_handle.lock().await = Some(handle);
            info!(target: "bedmix.worker", session = %self.ctx.id(), "Worker started");
        }
    }

    /// Keep the lookahead buffer at depth until stopped.
    ///
    /// Failures are recorded and retried on the next cycle; nothing escapes.
    async fn run_loop(&self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let next = {
                let state = self.ctx.lock().await;
                (state.lookahead.len() < self.config.lookahead_depth).then(|| state.next_index())
            };

            if let Some(index) = next {
                match self.prepare_chunk(index).await {
                    Ok(prepared) => {
                        info!(target: "bedmix.worker", session = %self.ctx.id(), chunk = prepared.descriptor.index, "Preloaded chunk");
                    }
                    Err(MixerError::Stopped) => break,
                    Err(e) => {
                        self.record_error(format!("Chunk {index} preparation failed: {e}"))
                            .await;
                    }
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
        info!(target: "bedmix.worker", session = %self.ctx.id(), "Worker loop exited");
    }

    // =========================================================================
    // Preparation
    // =========================================================================

    /// Assemble chunk `index`, mix it at immediate quality and enqueue it.
    ///
    /// The chunk is appended to the lookahead buffer before its upgrade task
    /// starts, so every upgrade finds its chunk in place.
    pub async fn prepare_chunk(&self, index: u64) -> MixerResult<PreparedChunk> {
        info!(target: "bedmix.worker", session = %self.ctx.id(), chunk = index, "Preparing chunk");

        let beds = match self.assembler.assemble(index).await {
            Ok(beds) => beds,
            Err(e) => {
                self.ctx.set_progress(index, MixStage::Failed, 0).await;
                return Err(e);
            }
        };

        let immediate = match self.upgrader.immediate(&beds).await {
            Ok(path) => path,
            Err(e) => {
                beds.cleanup().await;
                return Err(e);
            }
        };

        let descriptor = ChunkDescriptor::new(index, immediate, MixTier::Immediate);
        self.ctx
            .lock()
            .await
            .lookahead
            .push_back(descriptor.clone());

        let upgrade = self.tasks.spawn(Arc::clone(&self.upgrader).run_upgrade(
            descriptor.clone(),
            beds,
            self.swaps.clone(),
        ));

        Ok(PreparedChunk {
            descriptor,
            upgrade,
        })
    }

    // =========================================================================
    // Streaming boundary
    // =========================================================================

    /// The chunk now playing.
    ///
    /// If nothing has played yet, the head of the lookahead buffer is promoted.
    pub async fn current_chunk(&self) -> Option<ChunkDescriptor> {
        self.ctx.lock().await.promote_if_idle()
    }

    /// Prepared chunks waiting behind the current one, in play order.
    pub async fn peek_lookahead(&self) -> Vec<ChunkDescriptor> {
        self.ctx.lock().await.lookahead.iter().cloned().collect()
    }

    /// Move to the next prepared chunk, deleting the outgoing chunk's file.
    ///
    /// Fails with `NoChunkAvailable`, leaving everything as it was, when the
    /// lookahead buffer is empty.
    pub async fn advance(&self) -> MixerResult<ChunkDescriptor> {
        let mut state = self.ctx.lock().await;
        let promotion = state.advance()?;
        if let Some(outgoing) = &promotion.outgoing {
            remove_quietly(&outgoing.path).await;
        }
        drop(state);

        info!(target: "bedmix.worker", session = %self.ctx.id(), chunk = promotion.current.index, quality = %promotion.current.quality, "Advanced to chunk");
        Ok(promotion.current)
    }

    pub async fn status(&self) -> WorkerStatus {
        self.ctx
            .lock()
            .await
            .snapshot(self.ctx.id(), self.is_running())
    }

    /// Log an error and keep it in the status ring.
    pub async fn record_error(&self, message: impl Into<String>) {
        self.ctx.record_error(message).await;
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Stop the loop and wait a bounded time for it to exit.
    ///
    /// In-flight transcodes are not interrupted; upgrades finishing later
    /// are discarded. Use [`ChunkWorker::wait_finished`] to wait for them.
    pub async fn stop(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.ctx.lock().await.retired = true;

        let handle = self.loop_handle.lock().await.take();
        if let Some(handle) = handle {
            if tokio::time::timeout(self.config.stop_timeout, handle)
                .await
                .is_err()
            {
                warn!(target: "bedmix.worker", session = %self.ctx.id(), "Worker loop still busy after stop timeout, detaching");
            }
        }
        info!(target: "bedmix.worker", session = %self.ctx.id(), "Worker stopped");
    }

    /// Whether a stopped worker has no task left running.
    pub fn is_finished(&self) -> bool {
        self.tasks.is_closed() && self.tasks.is_empty()
    }

    /// Wait, without a time limit, until the loop, the applier and every
    /// upgrade task of a stopped worker have exited.
    ///
    /// Returns at once if the worker was never stopped.
    pub async fn wait_finished(&self) {
        if !self.tasks.is_closed() {
            return;
        }
        self.tasks.wait().await;
    }
}

#[cfg(test)]
impl ChunkWorker {
    pub(crate) fn context(&self) -> &Arc<SessionContext> {
        &self.ctx
    }
}
