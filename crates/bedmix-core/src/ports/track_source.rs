//! Track source port definition.
//!
//! A track source turns a playlist reference into item ids and materializes
//! single items as local audio files. Implementations own all network and
//! tool invocation details.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::{PlaylistRef, TrackKind};
use crate::mixing::MixerError;

/// Port for resolving playlists and fetching item audio.
#[async_trait]
pub trait TrackSourcePort: Send + Sync {
    /// Resolve up to `max_items` item ids from a playlist, in playlist order.
    ///
    /// Fails soft: any resolution error yields an empty list, which callers
    /// treat as "nothing new right now".
    async fn resolve_playlist(&self, playlist: &PlaylistRef, max_items: usize) -> Vec<String>;

    /// Fetch one item's audio into `dest_dir` and return the file path.
    ///
    /// Returns `FetchFailure` when the fetch itself fails and
    /// `CorruptDownload` when the result is missing or implausibly small.
    async fn fetch_audio(
        &self,
        item_id: &str,
        kind: TrackKind,
        dest_dir: &Path,
    ) -> Result<PathBuf, MixerError>;
}
