//! In-crate fakes of the ports used by pipeline tests.
//!
//! Fetched "audio" files contain their duration as text, so probing is a file
//! read and concatenated beds hold the sum of their inputs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bedmix_core::{
    MixJob, MixTier, MixerError, PlaylistRef, SessionId, SessionMeta, SessionStorePort,
    StorageLayout, TrackKind, TrackSourcePort, TranscodeFailure, TranscoderPort,
    RepositoryError,
};
use tempfile::TempDir;
use tokio::sync::Semaphore;

use crate::config::PipelineConfig;
use crate::gate::FinalMixGate;
use crate::session::SessionContext;
use crate::worker::WorkerDeps;

pub const MUSIC: &str = "PLmusic";
pub const SPEECH: &str = "PLspeech";

// =============================================================================
// Track source
// =============================================================================

#[derive(Default)]
pub struct FakeSource {
    /// Batches returned by successive resolutions, keyed by playlist URL.
    batches: Mutex<HashMap<String, VecDeque<Vec<String>>>>,
    durations: Mutex<HashMap<String, f64>>,
    failures: Mutex<HashMap<String, MixerError>>,
    resolutions: AtomicUsize,
}

impl FakeSource {
    /// Queue one resolution result for `playlist` with the given durations.
    pub fn script(&self, playlist: &str, items: &[(&str, f64)]) {
        let url = PlaylistRef::new(playlist).url().to_string();
        let mut durations = self.durations.lock().unwrap();
        for (id, secs) in items {
            durations.insert((*id).to_string(), *secs);
        }
        self.batches
            .lock()
            .unwrap()
            .entry(url)
            .or_default()
            .push_back(items.iter().map(|(id, _)| (*id).to_string()).collect());
    }

    /// Queue a batch whose ids fail to fetch.
    pub fn script_unfetchable(&self, playlist: &str, ids: &[&str]) {
        let url = PlaylistRef::new(playlist).url().to_string();
        self.batches
            .lock()
            .unwrap()
            .entry(url)
            .or_default()
            .push_back(ids.iter().map(|id| (*id).to_string()).collect());
    }

    /// Fetching `item_id` fails with `err`.
    pub fn fail_item(&self, item_id: &str, err: MixerError) {
        self.failures.lock().unwrap().insert(item_id.to_string(), err);
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackSourcePort for FakeSource {
    async fn resolve_playlist(&self, playlist: &PlaylistRef, max_items: usize) -> Vec<String> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        let mut batch = self
            .batches
            .lock()
            .unwrap()
            .get_mut(playlist.url())
            .and_then(VecDeque::pop_front)
            .unwrap_or_default();
        batch.truncate(max_items);
        batch
    }

    async fn fetch_audio(
        &self,
        item_id: &str,
        kind: TrackKind,
        dest_dir: &Path,
    ) -> Result<PathBuf, MixerError> {
        if let Some(err) = self.failures.lock().unwrap().get(item_id) {
            return Err(err.clone());
        }
        let duration = self.durations.lock().unwrap().get(item_id).copied();
        let Some(duration) = duration else {
            return Err(MixerError::FetchFailure {
                item_id: item_id.to_string(),
                message: "not scripted".to_string(),
            });
        };
        let path = dest_dir.join(format!("{kind}_{item_id}.mp3"));
        tokio::fs::write(&path, duration.to_string()).await?;
        Ok(path)
    }
}

// =============================================================================
// Transcoder
// =============================================================================

#[derive(Default)]
pub struct FakeTranscoder {
    failing: Mutex<HashSet<MixTier>>,
    fail_concat: AtomicBool,
    /// When set, final mixes wait for a permit before finishing.
    final_hold: Option<Arc<Semaphore>>,
    mix_delay: Option<Duration>,
    jobs: Mutex<Vec<MixJob>>,
    finals_running: AtomicUsize,
    peak_finals: AtomicUsize,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Final mixes block until `hold` gets permits.
    pub fn holding_finals(hold: Arc<Semaphore>) -> Self {
        Self {
            final_hold: Some(hold),
            ..Self::default()
        }
    }

    /// Every mix sleeps for `delay` before writing output.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            mix_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn fail_tier(&self, tier: MixTier) {
        self.failing.lock().unwrap().insert(tier);
    }

    pub fn fail_concat(&self) {
        self.fail_concat.store(true, Ordering::SeqCst);
    }

    pub fn jobs(&self) -> Vec<MixJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn jobs_for(&self, tier: MixTier) -> usize {
        self.jobs().iter().filter(|j| j.tier == tier).count()
    }

    /// Highest number of final mixes that were executing at once.
    pub fn peak_finals(&self) -> usize {
        self.peak_finals.load(Ordering::SeqCst)
    }
}

async fn read_secs(path: &Path) -> f64 {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0)
}

#[async_trait]
impl TranscoderPort for FakeTranscoder {
    async fn probe_duration(&self, path: &Path) -> f64 {
        read_secs(path).await
    }

    async fn concatenate(
        &self,
        inputs: &[PathBuf],
        output: &Path,
    ) -> Result<(), TranscodeFailure> {
        if self.fail_concat.load(Ordering::SeqCst) {
            tokio::fs::write(output, "partial").await.unwrap();
            return Err(TranscodeFailure::new(Some(1), "concat failed"));
        }
        let mut total = 0.0;
        for input in inputs {
            total += read_secs(input).await;
        }
        tokio::fs::write(output, total.to_string()).await.unwrap();
        Ok(())
    }

    async fn mix(&self, job: &MixJob) -> Result<(), TranscodeFailure> {
        self.jobs.lock().unwrap().push(job.clone());

        let is_final = job.tier == MixTier::Final;
        if is_final {
            let running = self.finals_running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_finals.fetch_max(running, Ordering::SeqCst);
            if let Some(hold) = &self.final_hold {
                hold.acquire().await.unwrap().forget();
            }
        }
        if let Some(delay) = self.mix_delay {
            tokio::time::sleep(delay).await;
        }
        if is_final {
            self.finals_running.fetch_sub(1, Ordering::SeqCst);
        }

        if self.failing.lock().unwrap().contains(&job.tier) {
            tokio::fs::write(&job.output, "partial").await.unwrap();
            return Err(TranscodeFailure::new(Some(1), format!("{} failed", job.tier)));
        }
        tokio::fs::write(&job.output, job.tier.as_str()).await.unwrap();
        Ok(())
    }
}

// =============================================================================
// Session store
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<SessionId, SessionMeta>>,
}

#[async_trait]
impl SessionStorePort for MemoryStore {
    async fn save(&self, meta: &SessionMeta) -> Result<(), RepositoryError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(meta.session_id.clone(), meta.clone());
        Ok(())
    }

    async fn load(&self, session_id: &SessionId) -> Result<Option<SessionMeta>, RepositoryError> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }
}

// =============================================================================
// Fixture
// =============================================================================

/// Config with a 100s target and millisecond timings.
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        target_duration_secs: 100.0,
        poll_interval: Duration::from_millis(10),
        final_poll_interval: Duration::from_millis(5),
        final_log_interval: Duration::from_millis(5),
        stop_timeout: Duration::from_secs(2),
        ..PipelineConfig::default()
    }
}

pub struct Fixture {
    pub temp: TempDir,
    pub layout: StorageLayout,
    pub source: Arc<FakeSource>,
    pub transcoder: Arc<FakeTranscoder>,
    pub gate: Arc<FinalMixGate>,
    pub config: Arc<PipelineConfig>,
}

impl Fixture {
    pub fn new(transcoder: FakeTranscoder) -> Self {
        Self::with_config(transcoder, fast_config())
    }

    pub fn with_config(transcoder: FakeTranscoder, config: PipelineConfig) -> Self {
        let temp = TempDir::new().unwrap();
        Self {
            layout: StorageLayout::new(temp.path()),
            temp,
            source: Arc::new(FakeSource::default()),
            transcoder: Arc::new(transcoder),
            gate: Arc::new(FinalMixGate::new()),
            config: Arc::new(config),
        }
    }

    pub fn deps(&self) -> WorkerDeps {
        WorkerDeps {
            source: self.source.clone(),
            transcoder: self.transcoder.clone(),
            gate: Arc::clone(&self.gate),
            config: Arc::clone(&self.config),
        }
    }

    pub fn context(&self) -> Arc<SessionContext> {
        Arc::new(SessionContext::new(MUSIC, SPEECH, &self.layout, 0))
    }

    /// Script `count` tracks of `secs` each for both playlists.
    pub fn script_both(&self, count: usize, secs: f64) {
        let music: Vec<(String, f64)> = (1..=count).map(|i| (format!("m{i}"), secs)).collect();
        let speech: Vec<(String, f64)> = (1..=count).map(|i| (format!("s{i}"), secs)).collect();
        self.source.script(MUSIC, &as_refs(&music));
        self.source.script(SPEECH, &as_refs(&speech));
    }
}

fn as_refs(items: &[(String, f64)]) -> Vec<(&str, f64)> {
    items.iter().map(|(id, s)| (id.as_str(), *s)).collect()
}
