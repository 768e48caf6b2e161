//! Three-tier mixing for one chunk.
//!
//! The immediate tier runs inline and its file is what the caller gets back.
//! Quick and final run afterwards in a detached upgrade task, one after the
//! other, and each success is handed to the worker's applier as a
//! [`TierUpgrade`] so only the applier ever rewrites chunk references.
//!
//! # Failure policy
//!
//! A failed or timed-out tier leaves the chunk at its last good tier. Beds and
//! source tracks are removed when the upgrade task ends, whatever the outcome.
//! Once the worker is cancelled no new tier starts and a final mix still
//! waiting at the gate gives up its place; a running transcode is left alone.

pub mod filters;
mod upgrade;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bedmix_core::{
    ChunkDescriptor, MixJob, MixStage, MixTier, MixerError, MixerResult, TranscodeFailure,
    TranscoderPort,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::assembler::{ChunkBeds, remove_quietly};
use crate::config::PipelineConfig;
use crate::gate::FinalMixGate;
use crate::progress::{ProgressThrottle, estimate_final_percent};
use crate::session::{SessionContext, SwapOutcome};

pub use filters::filter_graph;
pub use upgrade::{TierUpgrade, UpgradeReceiver, UpgradeReport, UpgradeSender, request_swap};

pub struct MixUpgrader {
    ctx: Arc<SessionContext>,
    transcoder: Arc<dyn TranscoderPort>,
    gate: Arc<FinalMixGate>,
    config: Arc<PipelineConfig>,
    cancel: CancellationToken,
}

impl MixUpgrader {
    pub fn new(
        ctx: Arc<SessionContext>,
        transcoder: Arc<dyn TranscoderPort>,
        gate: Arc<FinalMixGate>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            ctx,
            transcoder,
            gate,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop upgrading once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn job(&self, tier: MixTier, beds: &ChunkBeds) -> MixJob {
        MixJob {
            tier,
            filter_graph: filter_graph(tier),
            inputs: beds.inputs(),
            output: self.ctx.chunk_dir().join(tier.file_name(beds.index)),
        }
    }

    /// Run a mix with a hard time limit.
    async fn run_bounded(&self, job: &MixJob, limit: Duration) -> Result<(), TranscodeFailure> {
        tokio::time::timeout(limit, self.transcoder.mix(job))
            .await
            .unwrap_or_else(|_| Err(TranscodeFailure::timeout(limit.as_secs())))
    }

    /// Clean up after a failed tier and convert the failure.
    ///
    /// `fallback` is the stage the chunk's progress returns to.
    async fn tier_failed(
        &self,
        index: u64,
        job: &MixJob,
        failure: TranscodeFailure,
        fallback: MixStage,
    ) -> MixerError {
        remove_quietly(&job.output).await;
        let percent = if fallback == MixStage::Failed { 0 } else { 100 };
        self.ctx.set_progress(index, fallback, percent).await;
        MixerError::MixFailed {
            tier: job.tier,
            failure,
        }
    }

    // =========================================================================
    // Tiers
    // =========================================================================

    /// Unnormalized mix, produced inline for immediate playback.
    pub async fn immediate(&self, beds: &ChunkBeds) -> MixerResult<PathBuf> {
        let job = self.job(MixTier::Immediate, beds);
        self.ctx
            .set_progress(beds.index, MixStage::ImmediateMix, 0)
            .await;

        if let Err(failure) = self.run_bounded(&job, self.config.immediate_timeout).await {
            return Err(self
                .tier_failed(beds.index, &job, failure, MixStage::Failed)
                .await);
        }

        self.ctx
            .set_progress(beds.index, MixStage::ImmediateReady, 100)
            .await;
        info!(session = %self.ctx.id(), chunk = beds.index, "Immediate mix ready");
        Ok(job.output)
    }

    /// Per-track dynamic normalization.
    pub async fn quick(&self, beds: &ChunkBeds) -> MixerResult<PathBuf> {
        let job = self.job(MixTier::Quick, beds);
        self.ctx.set_progress(beds.index, MixStage::QuickMix, 0).await;

        if let Err(failure) = self.run_bounded(&job, self.config.quick_timeout).await {
            return Err(self
                .tier_failed(beds.index, &job, failure, MixStage::ImmediateReady)
                .await);
        }

        info!(session = %self.ctx.id(), chunk = beds.index, "Quick mix ready");
        Ok(job.output)
    }

    /// Loudness-standardized mix, serialized process-wide through the gate.
    ///
    /// Skipped with `CapacitySkipped` when this session already has
    /// `max_final_in_flight` final mixes waiting or running.
    pub async fn final_mix(&self, beds: &ChunkBeds) -> MixerResult<PathBuf> {
        let index = beds.index;
        {
            let mut state = self.ctx.lock().await;
            let in_flight = state.final_in_flight.len();
            if in_flight >= self.config.max_final_in_flight {
                return Err(MixerError::CapacitySkipped {
                    chunk: index,
                    in_flight,
                });
            }
            state.final_in_flight.insert(index);
        }

        let result = self.run_final(beds).await;
        self.ctx.lock().await.final_in_flight.remove(&index);
        result
    }

    async fn run_final(&self, beds: &ChunkBeds) -> MixerResult<PathBuf> {
        let index = beds.index;
        info!(session = %self.ctx.id(), chunk = index, queued = self.gate.queued(), "Waiting for final mix gate");
        let _pass = tokio::select! {
            pass = self.gate.admit() => pass?,
            () = self.cancel.cancelled() => return Err(MixerError::Stopped),
        };

        info!(session = %self.ctx.id(), chunk = index, "Final mix started");
        self.ctx.set_progress(index, MixStage::FinalMix, 0).await;

        let job = self.job(MixTier::Final, beds);
        let started = Instant::now();
        let mut throttle = ProgressThrottle::starting_now(self.config.final_log_interval);
        let mut liveness = tokio::time::interval(self.config.final_poll_interval);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The pinned future borrows `job`; keep it scoped to the wait
        let result = {
            let mix = self.transcoder.mix(&job);
            tokio::pin!(mix);

            loop {
                tokio::select! {
                    result = &mut mix => break result,
                    _ = liveness.tick() => {
                        if throttle.should_emit() {
                            let elapsed = started.elapsed();
                            let percent = estimate_final_percent(elapsed, self.config.final_progress_horizon);
                            info!(session = %self.ctx.id(), chunk = index, elapsed_secs = elapsed.as_secs(), percent, "Final mix running");
                            self.ctx.set_progress(index, MixStage::FinalMix, percent).await;
                        }
                    }
                }
            }
        };

        if let Err(failure) = result {
            return Err(self
                .tier_failed(index, &job, failure, MixStage::QuickReady)
                .await);
        }

        info!(session = %self.ctx.id(), chunk = index, elapsed_secs = started.elapsed().as_secs(), "Final mix done");
        Ok(job.output)
    }

    // =========================================================================
    // Upgrade task
    // =========================================================================

    /// Upgrade `chunk` from immediate to quick to final, then clean up.
    ///
    /// Stops at the first tier that fails, is skipped for capacity, or whose
    /// chunk has been retired.
    pub async fn run_upgrade(
        self: Arc<Self>,
        chunk: ChunkDescriptor,
        beds: ChunkBeds,
        swaps: UpgradeSender,
    ) -> UpgradeReport {
        let index = chunk.index;
        let mut report = UpgradeReport::new(index);
        let mut standing = chunk.path;

        for tier in [MixTier::Quick, MixTier::Final] {
            if self.cancel.is_cancelled() {
                info!(session = %self.ctx.id(), chunk = index, %tier, "Worker stopped, skipping remaining tiers");
                report.retired = true;
                break;
            }

            let produced = match tier {
                MixTier::Quick => self.quick(&beds).await,
                _ => self.final_mix(&beds).await,
            };

            let path = match produced {
                Ok(path) => path,
                Err(e) if e.is_capacity_skip() => {
                    warn!(session = %self.ctx.id(), chunk = index, reason = %e, "Final mix skipped, keeping quick quality");
                    report.stopped_by = Some(e);
                    break;
                }
                Err(MixerError::Stopped) => {
                    info!(session = %self.ctx.id(), chunk = index, %tier, "Worker stopped while waiting for the final mix gate");
                    report.retired = true;
                    break;
                }
                Err(e) => {
                    self.ctx
                        .record_error(format!("Chunk {index}: {e}"))
                        .await;
                    report.stopped_by = Some(e);
                    break;
                }
            };

            match request_swap(&swaps, index, tier, standing.clone(), path.clone()).await {
                SwapOutcome::Applied => {
                    self.ctx
                        .set_progress(index, MixStage::ready(tier), 100)
                        .await;
                    info!(session = %self.ctx.id(), chunk = index, %tier, "Upgraded chunk");
                    report.reached = tier;
                    standing = path;
                }
                SwapOutcome::Retired => {
                    remove_quietly(&path).await;
                    info!(session = %self.ctx.id(), chunk = index, %tier, "Chunk retired, dropping upgrade");
                    report.retired = true;
                    break;
                }
            }
        }

        beds.cleanup().await;
        info!(session = %self.ctx.id(), chunk = index, reached = %report.reached, "Upgrade pipeline complete");
        report
    }
}
