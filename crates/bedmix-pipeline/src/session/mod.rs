//! Per-session identity and locked state.
//!
//! A `SessionContext` is shared (via `Arc`) by the worker, its assembler, its
//! upgrader and the applier task. All mutable fields sit behind one lock.

mod error_log;
mod state;

use std::path::{Path, PathBuf};

use bedmix_core::{MixStage, PlaylistRef, SessionId, StorageLayout, TrackKind};
use tokio::sync::{Mutex, MutexGuard};

pub use error_log::{ERROR_LOG_CAPACITY, ErrorLog};
pub use state::{Promotion, SessionState, SwapOutcome};

pub struct SessionContext {
    id: SessionId,
    music: PlaylistRef,
    speech: PlaylistRef,
    raw_dir: PathBuf,
    chunk_dir: PathBuf,
    state: Mutex<SessionState>,
}

impl SessionContext {
    /// Build the context for a playlist pair under `layout`.
    ///
    /// `base_index` is the highest chunk index already on disk for this
    /// session, so new chunks never overwrite retained ones.
    pub fn new(
        music_ref: &str,
        speech_ref: &str,
        layout: &StorageLayout,
        base_index: u64,
    ) -> Self {
        let id = SessionId::from_playlists(music_ref, speech_ref);
        Self {
            raw_dir: layout.raw_audio_dir(&id),
            chunk_dir: layout.chunk_dir(&id),
            music: PlaylistRef::new(music_ref),
            speech: PlaylistRef::new(speech_ref),
            id,
            state: Mutex::new(SessionState::starting_after(base_index)),
        }
    }

    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    pub const fn playlist(&self, kind: TrackKind) -> &PlaylistRef {
        match kind {
            TrackKind::Music => &self.music,
            TrackKind::Speech => &self.speech,
        }
    }

    /// Directory for downloaded tracks.
    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    /// Directory for beds and mixed chunk files.
    pub fn chunk_dir(&self) -> &Path {
        &self.chunk_dir
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    pub async fn set_progress(&self, index: u64, stage: MixStage, percent: u8) {
        self.lock().await.set_progress(index, stage, percent);
    }

    /// Log an error and keep it in the session's ring.
    pub async fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(session = %self.id, "{message}");
        self.lock().await.push_error(message);
    }
}

/// Highest chunk index among mixed chunk files in `dir` (0 if none).
///
/// Recognizes `<n>.mp3`, `<n>_quick.mp3` and `<n>_immediate.mp3`.
pub async fn highest_chunk_index(dir: &Path) -> u64 {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };

    let mut highest = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".mp3")) else {
            continue;
        };
        let digits = stem
            .strip_suffix("_quick")
            .or_else(|| stem.strip_suffix("_immediate"))
            .unwrap_or(stem);
        if let Ok(index) = digits.parse::<u64>() {
            highest = highest.max(index);
        }
    }
    highest
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_context_paths_follow_layout() {
        let layout = StorageLayout::new("/data");
        let ctx = SessionContext::new("PLm", "PLs", &layout, 0);

        assert_eq!(ctx.id(), &SessionId::from_playlists("PLm", "PLs"));
        assert_eq!(ctx.raw_dir(), layout.raw_audio_dir(ctx.id()));
        assert_eq!(ctx.chunk_dir(), layout.chunk_dir(ctx.id()));
        assert!(ctx.playlist(TrackKind::Speech).url().ends_with("list=PLs"));
        assert_eq!(ctx.lock().await.next_index(), 1);
    }

    #[tokio::test]
    async fn test_record_error_lands_in_ring() {
        let ctx = SessionContext::new("m", "s", &StorageLayout::new("/data"), 0);
        ctx.record_error("concat failed").await;
        let state = ctx.lock().await;
        assert_eq!(state.errors.recent(5)[0].message, "concat failed");
    }

    #[tokio::test]
    async fn test_highest_chunk_index_scans_tier_names() {
        let temp = TempDir::new().unwrap();
        for name in ["1.mp3", "2_quick.mp3", "4_immediate.mp3", "m_tmp_9.mp3", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"x").unwrap();
        }
        assert_eq!(highest_chunk_index(temp.path()).await, 4);
        assert_eq!(highest_chunk_index(&temp.path().join("missing")).await, 0);
    }
}
