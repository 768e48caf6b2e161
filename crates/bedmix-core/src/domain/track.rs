//! Track-level domain types.
//!
//! Pure data types with no I/O dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which bed a track belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Music,
    Speech,
}

impl TrackKind {
    /// Both kinds, in mixing input order.
    pub const ALL: [Self; 2] = [Self::Music, Self::Speech];

    /// Short name used in file names and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Speech => "speech",
        }
    }

    /// Prefix of the concatenated bed file for this kind (`m` / `s`).
    #[must_use]
    pub const fn bed_prefix(self) -> &'static str {
        match self {
            Self::Music => "m",
            Self::Speech => "s",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetched item: external id, local audio file and its probed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub item_id: String,
    pub path: PathBuf,
    pub duration_secs: f64,
}

impl Track {
    pub fn new(item_id: impl Into<String>, path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            item_id: item_id.into(),
            path: path.into(),
            duration_secs,
        }
    }
}

/// Total duration of a set of tracks, in seconds.
#[must_use]
pub fn total_duration(tracks: &[Track]) -> f64 {
    tracks.iter().map(|t| t.duration_secs).sum()
}

const PLAYLIST_URL_PREFIX: &str = "https://www.youtube.com/playlist?list=";

/// A playlist reference as the user typed it, normalized to a fetchable URL.
///
/// Accepts either a full youtube.com URL or a bare playlist id. Share tokens
/// (`&si=...`) are dropped either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaylistRef {
    raw: String,
    url: String,
}

impl PlaylistRef {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let url = Self::normalize(&raw);
        Self { raw, url }
    }

    /// The reference exactly as given.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The normalized playlist URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn normalize(raw: &str) -> String {
        let trimmed = raw.trim();
        let without_share = trimmed
            .find("&si=")
            .map_or(trimmed, |pos| &trimmed[..pos]);

        if without_share.contains("youtube.com") {
            return without_share.to_string();
        }

        let id = without_share
            .split('&')
            .next()
            .unwrap_or(without_share);
        format!("{PLAYLIST_URL_PREFIX}{id}")
    }
}

impl fmt::Display for PlaylistRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id_becomes_playlist_url() {
        let r = PlaylistRef::new("PLabc123");
        assert_eq!(r.url(), "https://www.youtube.com/playlist?list=PLabc123");
        assert_eq!(r.raw(), "PLabc123");
    }

    #[test]
    fn test_share_token_is_stripped() {
        let r = PlaylistRef::new("https://www.youtube.com/playlist?list=PLx&si=abcdef");
        assert_eq!(r.url(), "https://www.youtube.com/playlist?list=PLx");

        let r = PlaylistRef::new("PLx&si=abcdef");
        assert_eq!(r.url(), "https://www.youtube.com/playlist?list=PLx");
    }

    #[test]
    fn test_bare_id_drops_trailing_params() {
        let r = PlaylistRef::new("  PLx&index=3 ");
        assert_eq!(r.url(), "https://www.youtube.com/playlist?list=PLx");
    }

    #[test]
    fn test_full_url_is_kept() {
        let url = "https://www.youtube.com/watch?v=abc&list=PLy";
        assert_eq!(PlaylistRef::new(url).url(), url);
    }

    #[test]
    fn test_total_duration() {
        let tracks = vec![Track::new("a", "/a", 1.5), Track::new("b", "/b", 2.5)];
        assert!((total_duration(&tracks) - 4.0).abs() < f64::EPSILON);
        assert_eq!(TrackKind::Music.to_string(), "music");
        assert_eq!(TrackKind::Speech.bed_prefix(), "s");
    }
}
