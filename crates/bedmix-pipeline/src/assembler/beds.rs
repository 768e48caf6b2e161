//! Per-chunk temporary artifacts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bedmix_core::{Track, TrackKind};
use tracing::warn;

/// The two beds of one chunk plus the tracks they were built from.
///
/// Lives from assembly until the chunk's last mix tier finishes or fails.
#[derive(Debug, Clone)]
pub struct ChunkBeds {
    pub index: u64,
    music_bed: PathBuf,
    speech_bed: PathBuf,
    music_tracks: Vec<Track>,
    speech_tracks: Vec<Track>,
}

impl ChunkBeds {
    pub fn new(index: u64, chunk_dir: &Path, music: Vec<Track>, speech: Vec<Track>) -> Self {
        Self {
            index,
            music_bed: Self::bed_path(chunk_dir, TrackKind::Music, index),
            speech_bed: Self::bed_path(chunk_dir, TrackKind::Speech, index),
            music_tracks: music,
            speech_tracks: speech,
        }
    }

    /// `<chunk_dir>/m_tmp_<index>.mp3` or `<chunk_dir>/s_tmp_<index>.mp3`.
    pub fn bed_path(chunk_dir: &Path, kind: TrackKind, index: u64) -> PathBuf {
        chunk_dir.join(format!("{}_tmp_{index}.mp3", kind.bed_prefix()))
    }

    pub fn bed(&self, kind: TrackKind) -> &Path {
        match kind {
            TrackKind::Music => &self.music_bed,
            TrackKind::Speech => &self.speech_bed,
        }
    }

    pub fn tracks(&self, kind: TrackKind) -> &[Track] {
        match kind {
            TrackKind::Music => &self.music_tracks,
            TrackKind::Speech => &self.speech_tracks,
        }
    }

    /// Bed inputs in mixing order (music first).
    pub fn inputs(&self) -> Vec<PathBuf> {
        vec![self.music_bed.clone(), self.speech_bed.clone()]
    }

    /// Remove both beds and every source track.
    pub async fn cleanup(&self) {
        remove_quietly(&self.music_bed).await;
        remove_quietly(&self.speech_bed).await;
        for track in self.music_tracks.iter().chain(&self.speech_tracks) {
            remove_quietly(&track.path).await;
        }
    }
}

/// Delete a file, treating "already gone" as success.
pub async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}
