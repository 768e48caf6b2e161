//! The process's single active session, plus on-disk session housekeeping.
//!
//! At most one worker runs at a time. Switching playlists stops the previous
//! worker and drops its raw track cache; its mixed chunks stay on disk until
//! deleted or pruned.
//!
//! A stopped worker may still be finishing a transcode. Such workers are kept
//! aside and waited for before their session gets a new worker or is deleted,
//! so two workers never write the same session's files.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bedmix_core::{
    MixerError, MixerResult, SessionId, SessionMeta, SessionStorePort, SessionSummary,
    StorageLayout,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::session::{SessionContext, highest_chunk_index};
use crate::worker::{ChunkWorker, WorkerDeps};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

type ActiveSession = (SessionId, Arc<ChunkWorker>);

pub struct SessionRegistry {
    layout: StorageLayout,
    deps: WorkerDeps,
    store: Arc<dyn SessionStorePort>,
    active: Mutex<Option<ActiveSession>>,
    /// Stopped workers with tasks still running.
    retiring: Mutex<Vec<Arc<ChunkWorker>>>,
    maintenance_started: AtomicBool,
    maintenance_cancel: CancellationToken,
    maintenance_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionRegistry {
    pub fn new(layout: StorageLayout, deps: WorkerDeps, store: Arc<dyn SessionStorePort>) -> Self {
        Self {
            layout,
            deps,
            store,
            active: Mutex::new(None),
            retiring: Mutex::new(Vec::new()),
            maintenance_started: AtomicBool::new(false),
            maintenance_cancel: CancellationToken::new(),
            maintenance_handle: Mutex::new(None),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    // =========================================================================
    // Active session
    // =========================================================================

    /// Return the running worker for this playlist pair, creating it if needed.
    ///
    /// A different active session is stopped first and its raw track cache
    /// removed. The new session's metadata is saved so it can be resumed.
    pub async fn get_or_create(
        &self,
        music_ref: &str,
        speech_ref: &str,
    ) -> MixerResult<Arc<ChunkWorker>> {
        let session_id = SessionId::from_playlists(music_ref, speech_ref);
        let mut active = self.active.lock().await;

        if let Some((id, worker)) = active.as_ref() {
            if *id == session_id {
                return Ok(Arc::clone(worker));
            }
        }

        if let Some((previous_id, previous)) = active.take() {
            info!(target: "bedmix.registry", from = %previous_id, to = %session_id, "Switching session");
            previous.stop().await;
            remove_dir_quietly(&self.layout.raw_audio_dir(&previous_id)).await;
            self.retire(previous).await;
        }

        self.drain_retired(&session_id).await;

        let base_index = highest_chunk_index(&self.layout.chunk_dir(&session_id)).await;
        let ctx = Arc::new(SessionContext::new(
            music_ref,
            speech_ref,
            &self.layout,
            base_index,
        ));
        tokio::fs::create_dir_all(ctx.chunk_dir()).await?;

        let meta = SessionMeta::new(music_ref, speech_ref);
        if let Err(e) = self.store.save(&meta).await {
            warn!(target: "bedmix.registry", session = %session_id, error = %e, "Failed to save session metadata");
        }

        let worker = ChunkWorker::new(ctx, &self.deps);
        worker.start().await;
        info!(target: "bedmix.registry", session = %session_id, base_index, "Session active");

        *active = Some((session_id, Arc::clone(&worker)));
        Ok(worker)
    }

    /// Resume a bookmarked session by id.
    pub async fn load_session(&self, session_id: &SessionId) -> MixerResult<Arc<ChunkWorker>> {
        let meta = self
            .store
            .load(session_id)
            .await
            .map_err(|e| MixerError::internal(e.to_string()))?
            .ok_or_else(|| MixerError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        self.get_or_create(&meta.music_ref, &meta.speech_ref).await
    }

    /// The running worker, if any.
    pub async fn active(&self) -> Option<Arc<ChunkWorker>> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|(_, worker)| Arc::clone(worker))
    }

    pub async fn active_id(&self) -> Option<SessionId> {
        self.active.lock().await.as_ref().map(|(id, _)| id.clone())
    }

    /// The worker running `session_id`, or `SessionNotFound`.
    pub async fn worker(&self, session_id: &SessionId) -> MixerResult<Arc<ChunkWorker>> {
        match self.active.lock().await.as_ref() {
            Some((id, worker)) if id == session_id => Ok(Arc::clone(worker)),
            _ => Err(MixerError::SessionNotFound {
                session_id: session_id.to_string(),
            }),
        }
    }

    /// Keep a stopped worker until its tasks have exited.
    async fn retire(&self, worker: Arc<ChunkWorker>) {
        let mut retiring = self.retiring.lock().await;
        retiring.retain(|w| !w.is_finished());
        if !worker.is_finished() {
            info!(target: "bedmix.registry", session = %worker.session_id(), "Stopped worker still finishing");
            retiring.push(worker);
        }
    }

    /// Wait until no stopped worker of `session_id` is left running.
    async fn drain_retired(&self, session_id: &SessionId) {
        let pending: Vec<Arc<ChunkWorker>> = {
            let mut retiring = self.retiring.lock().await;
            let (pending, others) = retiring
                .drain(..)
                .partition(|w| w.session_id() == session_id);
            *retiring = others;
            pending
        };

        for worker in pending {
            info!(target: "bedmix.registry", session = %session_id, "Waiting for stopped worker to finish");
            worker.wait_finished().await;
        }
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Stop the session if active and remove all of its storage.
    pub async fn delete(&self, session_id: &SessionId) {
        {
            let mut active = self.active.lock().await;
            if active.as_ref().is_some_and(|(id, _)| id == session_id) {
                if let Some((_, worker)) = active.take() {
                    worker.stop().await;
                    self.retire(worker).await;
                }
            }
        }
        self.drain_retired(session_id).await;

        remove_dir_quietly(&self.layout.raw_audio_dir(session_id)).await;
        remove_dir_quietly(&self.layout.chunk_dir(session_id)).await;
        info!(target: "bedmix.registry", session = %session_id, "Session deleted");
    }

    /// Every session with a chunk directory on disk, sorted by id.
    pub async fn list_sessions(&self) -> MixerResult<Vec<SessionSummary>> {
        let active_id = self.active_id().await;
        let mut sessions = Vec::new();

        let mut entries = match tokio::fs::read_dir(self.layout.chunk_root()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(sessions),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(session_id) = entry.file_name().to_str().and_then(SessionId::parse) else {
                continue;
            };

            let (chunk_count, bytes) = chunk_usage(&entry.path()).await?;
            let meta = self.store.load(&session_id).await.unwrap_or_default();
            sessions.push(SessionSummary {
                active: active_id.as_ref() == Some(&session_id),
                session_id,
                chunk_count,
                size_mib: bytes as f64 / BYTES_PER_MIB,
                meta,
            });
        }

        sessions.sort_by(|a, b| a.session_id.as_str().cmp(b.session_id.as_str()));
        Ok(sessions)
    }

    /// Remove inactive sessions untouched for longer than the prune age.
    pub async fn prune_idle(&self) -> MixerResult<Vec<SessionId>> {
        self.prune_idle_at(Utc::now()).await
    }

    /// [`prune_idle`](Self::prune_idle) against an explicit clock.
    pub async fn prune_idle_at(&self, now: DateTime<Utc>) -> MixerResult<Vec<SessionId>> {
        let max_age = chrono::Duration::from_std(self.deps.config.prune_age)
            .map_err(|e| MixerError::internal(format!("prune age out of range: {e}")))?;
        let cutoff = now - max_age;
        let active_id = self.active_id().await;
        let mut pruned = Vec::new();

        for root in [self.layout.chunk_root(), self.layout.raw_audio_root()] {
            let mut entries = match tokio::fs::read_dir(&root).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let Some(session_id) = entry.file_name().to_str().and_then(SessionId::parse)
                else {
                    continue;
                };
                if active_id.as_ref() == Some(&session_id) {
                    continue;
                }

                let modified: DateTime<Utc> = entry.metadata().await?.modified()?.into();
                if modified < cutoff {
                    remove_dir_quietly(&entry.path()).await;
                    if !pruned.contains(&session_id) {
                        pruned.push(session_id);
                    }
                }
            }
        }

        if !pruned.is_empty() {
            info!(target: "bedmix.registry", count = pruned.len(), "Pruned idle sessions");
        }
        Ok(pruned)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the periodic prune task.
    ///
    /// This method is idempotent: calling it multiple times has no effect
    /// after the first call.
    pub async fn start_maintenance(self: &Arc<Self>) {
        if self
            .maintenance_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let registry = Arc::clone(self);
        let cancel = self.maintenance_cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(registry.deps.config.prune_interval);
            // The first tick completes immediately; skip it
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = registry.prune_idle().await {
                            warn!(target: "bedmix.registry", error = %e, "Prune sweep failed");
                        }
                    }
                }
            }
        });
        *self.maintenance_handle.lock().await = Some(handle);
        info!(target: "bedmix.registry", "Maintenance started");
    }

    /// Stop maintenance and the active worker.
    pub async fn shutdown(&self) {
        self.maintenance_cancel.cancel();
        if let Some(handle) = self.maintenance_handle.lock().await.take() {
            let _ = handle.await;
        }
        if let Some((id, worker)) = self.active.lock().await.take() {
            worker.stop().await;
            info!(target: "bedmix.registry", session = %id, "Active session stopped");
        }
    }
}

/// Count `*.mp3` files in a chunk directory and sum their sizes.
async fn chunk_usage(dir: &Path) -> MixerResult<(usize, u64)> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0;
    let mut bytes = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "mp3") {
            count += 1;
            bytes += entry.metadata().await?.len();
        }
    }
    Ok((count, bytes))
}

async fn remove_dir_quietly(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dir.display(), error = %e, "Failed to remove directory"),
    }
}

#[cfg(test)]
mod tests;
