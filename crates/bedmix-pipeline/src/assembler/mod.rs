//! Chunk assembly: collect tracks up to a target duration and join them into
//! one bed per track kind.
//!
//! Music and speech are collected by two concurrent tasks. Per-track failures
//! (fetch errors, corrupt or too-short downloads) are skipped by moving on to
//! the next queue item; only an empty collection, a failed concatenation or
//! a stopped worker aborts the chunk. Cancellation is checked between items,
//! never in the middle of a fetch.

mod beds;

use std::path::PathBuf;
use std::sync::Arc;

use bedmix_core::{
    MixStage, MixerError, MixerResult, Track, TrackKind, TrackSourcePort,
    TranscoderPort, total_duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{EARLY_STOP_RATIO, MIN_TRACK_SECS, PipelineConfig};
use crate::queue::REFILL_BATCH;
use crate::session::{SessionContext, SessionState};

pub use beds::{ChunkBeds, remove_quietly};

/// Consecutive skipped items after which a collection gives up.
///
/// Guards against a playlist whose every item fails to download.
const MAX_CONSECUTIVE_SKIPS: usize = 2 * REFILL_BATCH;

#[derive(Clone)]
pub struct ChunkAssembler {
    ctx: Arc<SessionContext>,
    source: Arc<dyn TrackSourcePort>,
    transcoder: Arc<dyn TranscoderPort>,
    config: Arc<PipelineConfig>,
    cancel: CancellationToken,
}

impl ChunkAssembler {
    pub fn new(
        ctx: Arc<SessionContext>,
        source: Arc<dyn TrackSourcePort>,
        transcoder: Arc<dyn TranscoderPort>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            ctx,
            source,
            transcoder,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop collecting once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    // =========================================================================
    // Queue operations
    // =========================================================================

    /// Top up the `kind` queue from the source if it is below the low-water mark.
    ///
    /// Returns the number of ids added. An empty resolution is logged, not an error.
    pub async fn refill(&self, kind: TrackKind) -> usize {
        let mut state = self.ctx.lock().await;
        self.refill_locked(&mut state, kind).await
    }

    async fn refill_locked(&self, state: &mut SessionState, kind: TrackKind) -> usize {
        if !state.queues.get(kind).needs_refill() {
            return 0;
        }

        let playlist = self.ctx.playlist(kind);
        let batch = self.source.resolve_playlist(playlist, REFILL_BATCH).await;
        if batch.is_empty() {
            warn!(session = %self.ctx.id(), %kind, playlist = %playlist, "Playlist resolved to no items");
            return 0;
        }

        let added = state
            .queues
            .get_mut(kind)
            .extend_shuffled(batch, &mut rand::thread_rng());
        info!(session = %self.ctx.id(), %kind, added, "Refilled queue");
        added
    }

    /// Refill if needed, then remove and return the head item.
    ///
    /// The session lock is held across the refill so two collectors of the
    /// same kind can never both see an empty queue.
    pub async fn pop_next(&self, kind: TrackKind) -> MixerResult<String> {
        let mut state = self.ctx.lock().await;
        self.refill_locked(&mut state, kind).await;
        state
            .queues
            .get_mut(kind)
            .pop_front()
            .ok_or(MixerError::QueueExhausted { kind })
    }

    /// Put `item` back at the head of the `kind` queue.
    pub async fn requeue_front(&self, kind: TrackKind, item: String) {
        self.ctx.lock().await.queues.get_mut(kind).requeue_front(item);
    }

    // =========================================================================
    // Collection
    // =========================================================================

    /// Collect tracks of `kind` until their total reaches `target_secs`.
    ///
    /// Once the running total passes 90% of the target the next item is put
    /// back at the head of the queue instead of being fetched.
    ///
    /// Fails with `Stopped` if the worker is cancelled between items, and with
    /// the source's error if it is not a per-track failure. Tracks collected
    /// so far are removed in both cases.
    pub async fn collect(&self, kind: TrackKind, target_secs: f64) -> MixerResult<Vec<Track>> {
        tokio::fs::create_dir_all(self.ctx.raw_dir()).await?;

        let early_stop = target_secs * EARLY_STOP_RATIO;
        let mut tracks = Vec::new();
        let mut total = 0.0;
        let mut skipped = 0;

        while total < target_secs {
            if self.cancel.is_cancelled() {
                info!(session = %self.ctx.id(), %kind, collected = tracks.len(), "Worker stopped, abandoning collection");
                remove_tracks(&tracks).await;
                return Err(MixerError::Stopped);
            }

            let item = match self.pop_next(kind).await {
                Ok(item) => item,
                Err(e) => {
                    self.ctx.record_error(e.to_string()).await;
                    break;
                }
            };

            if total > early_stop {
                info!(session = %self.ctx.id(), %kind, total, "Within 90% of target, stopping");
                self.requeue_front(kind, item).await;
                break;
            }

            match self.fetch_track(kind, &item).await {
                Ok(track) => {
                    skipped = 0;
                    total += track.duration_secs;
                    debug!(session = %self.ctx.id(), %kind, item = %item, duration = track.duration_secs, total, "Added track");
                    tracks.push(track);
                }
                Err(e) if !e.is_per_track() => {
                    remove_tracks(&tracks).await;
                    return Err(e);
                }
                Err(e) => {
                    warn!(session = %self.ctx.id(), %kind, error = %e, "Skipping track");
                    skipped += 1;
                    if skipped >= MAX_CONSECUTIVE_SKIPS {
                        self.ctx
                            .record_error(format!("Gave up on {kind} after {skipped} failed items"))
                            .await;
                        break;
                    }
                }
            }
        }

        info!(session = %self.ctx.id(), %kind, count = tracks.len(), total, "Collection finished");
        Ok(tracks)
    }

    /// Fetch and probe one item, discarding unusable audio.
    async fn fetch_track(&self, kind: TrackKind, item: &str) -> MixerResult<Track> {
        let path = self
            .source
            .fetch_audio(item, kind, self.ctx.raw_dir())
            .await?;

        let duration = self.transcoder.probe_duration(&path).await;
        if duration <= MIN_TRACK_SECS {
            remove_quietly(&path).await;
            return Err(MixerError::FetchFailure {
                item_id: item.to_string(),
                message: format!("unusable duration {duration:.1}s"),
            });
        }
        Ok(Track::new(item, path, duration))
    }

    // =========================================================================
    // Concatenation
    // =========================================================================

    /// Join `tracks` in order into the `kind` bed for chunk `index`.
    pub async fn concatenate(
        &self,
        kind: TrackKind,
        index: u64,
        tracks: &[Track],
    ) -> MixerResult<PathBuf> {
        let output = ChunkBeds::bed_path(self.ctx.chunk_dir(), kind, index);
        let inputs: Vec<PathBuf> = tracks.iter().map(|t| t.path.clone()).collect();

        if let Err(failure) = self.transcoder.concatenate(&inputs, &output).await {
            remove_quietly(&output).await;
            return Err(MixerError::ConcatenationFailed { kind, failure });
        }

        info!(session = %self.ctx.id(), chunk = index, %kind, tracks = tracks.len(), "Concatenated bed");
        Ok(output)
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    /// Collect both kinds concurrently and build the two beds for chunk `index`.
    ///
    /// On any failure every track and bed produced for this chunk is removed.
    pub async fn assemble(&self, index: u64) -> MixerResult<ChunkBeds> {
        self.ctx.set_progress(index, MixStage::Collecting, 0).await;
        tokio::fs::create_dir_all(self.ctx.chunk_dir()).await?;

        let target = self.config.target_duration_secs;
        let music_task = {
            let this = self.clone();
            tokio::spawn(async move { this.collect(TrackKind::Music, target).await })
        };
        let speech_task = {
            let this = self.clone();
            tokio::spawn(async move { this.collect(TrackKind::Speech, target).await })
        };

        let (music, speech) = tokio::join!(music_task, speech_task);
        let music = flatten(music);
        let speech = flatten(speech);

        let (music, speech) = match (music, speech) {
            (Ok(m), Ok(s)) if !m.is_empty() && !s.is_empty() => (m, s),
            (music, speech) => {
                let err = first_failure(&music, &speech);
                let leftovers: Vec<Track> = [music, speech]
                    .into_iter()
                    .filter_map(Result::ok)
                    .flatten()
                    .collect();
                remove_tracks(&leftovers).await;
                return Err(err);
            }
        };

        if self.cancel.is_cancelled() {
            let leftovers: Vec<Track> = music.into_iter().chain(speech).collect();
            remove_tracks(&leftovers).await;
            return Err(MixerError::Stopped);
        }

        info!(
            session = %self.ctx.id(),
            chunk = index,
            music_secs = total_duration(&music),
            speech_secs = total_duration(&speech),
            "Collected tracks"
        );

        let beds = ChunkBeds::new(index, self.ctx.chunk_dir(), music, speech);
        self.ctx.set_progress(index, MixStage::Concatenating, 0).await;

        for kind in TrackKind::ALL {
            if let Err(e) = self.concatenate(kind, index, beds.tracks(kind)).await {
                beds.cleanup().await;
                return Err(e);
            }
        }

        Ok(beds)
    }
}

async fn remove_tracks(tracks: &[Track]) {
    let paths: Vec<PathBuf> = tracks.iter().map(|t| t.path.clone()).collect();
    for path in paths {
        remove_quietly(&path).await;
    }
}

fn flatten(
    joined: Result<MixerResult<Vec<Track>>, tokio::task::JoinError>,
) -> MixerResult<Vec<Track>> {
    joined.unwrap_or_else(|e| Err(MixerError::internal(format!("collection task failed: {e}"))))
}

fn first_failure(music: &MixerResult<Vec<Track>>, speech: &MixerResult<Vec<Track>>) -> MixerError {
    match (music, speech) {
        (Err(e), _) | (_, Err(e)) => e.clone(),
        (Ok(m), _) if m.is_empty() => MixerError::EmptyCollection {
            kind: TrackKind::Music,
        },
        _ => MixerError::EmptyCollection {
            kind: TrackKind::Speech,
        },
    }
}

#[cfg(test)]
mod tests;
