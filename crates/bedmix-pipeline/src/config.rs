//! Runtime configuration handed to the pipeline.
//!
//! `PipelineConfig` is derived from [`MixerSettings`] once at startup; the
//! timing fields are fixed policy and only shortened by tests.

use std::time::Duration;

use bedmix_core::MixerSettings;

/// Fraction of the target duration after which collection stops early.
pub const EARLY_STOP_RATIO: f64 = 0.9;

/// Tracks at or below this duration are rejected as unusable.
pub const MIN_TRACK_SECS: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Target duration of each bed, in seconds.
    pub target_duration_secs: f64,
    /// Prepared chunks kept ahead of the current one.
    pub lookahead_depth: usize,
    /// Final mixes a session may have queued or running.
    pub max_final_in_flight: usize,
    /// Sleep between background loop checks.
    pub poll_interval: Duration,
    pub immediate_timeout: Duration,
    pub quick_timeout: Duration,
    /// Liveness check cadence while a final mix runs.
    pub final_poll_interval: Duration,
    /// How often a running final mix logs and updates its estimate.
    pub final_log_interval: Duration,
    /// Elapsed time mapped to 100% in the final-mix estimate (capped at 95).
    pub final_progress_horizon: Duration,
    /// Bounded wait when joining a stopped worker's loop.
    pub stop_timeout: Duration,
    /// Cadence of the idle-session sweep.
    pub prune_interval: Duration,
    /// Idle sessions older than this are pruned.
    pub prune_age: Duration,
}

impl PipelineConfig {
    #[must_use]
    pub fn from_settings(settings: &MixerSettings) -> Self {
        Self {
            target_duration_secs: settings.effective_chunk_duration_secs() as f64,
            lookahead_depth: settings.effective_lookahead_depth(),
            max_final_in_flight: settings.effective_max_final_in_flight(),
            prune_age: Duration::from_secs(u64::from(settings.effective_prune_age_days()) * 86_400),
            ..Self::default()
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_duration_secs: 3600.0,
            lookahead_depth: 2,
            max_final_in_flight: 2,
            poll_interval: Duration::from_secs(5),
            immediate_timeout: Duration::from_secs(600),
            quick_timeout: Duration::from_secs(6000),
            final_poll_interval: Duration::from_secs(1),
            final_log_interval: Duration::from_secs(30),
            final_progress_horizon: Duration::from_secs(300),
            stop_timeout: Duration::from_secs(5),
            prune_interval: Duration::from_secs(3600),
            prune_age: Duration::from_secs(7 * 86_400),
        }
    }
}
