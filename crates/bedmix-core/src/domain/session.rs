//! Session identity and bookmark types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters kept from the digest.
const SESSION_ID_LEN: usize = 12;

/// Stable identifier of a (music, speech) playlist pair.
///
/// Derived from a SHA-256 digest of `"<music>|<speech>"` (both trimmed), so the
/// same pair maps to the same id across restarts.
///
/// The digest is SHA-256 rather than MD5, so ids do not match directories
/// written by MD5-based tools for the same pair. Only the 12-hex-character
/// shape is part of the format; changing the digest orphans existing sessions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Derive the id for a playlist pair.
    #[must_use]
    pub fn from_playlists(music_ref: &str, speech_ref: &str) -> Self {
        let digest = Sha256::digest(format!("{}|{}", music_ref.trim(), speech_ref.trim()));
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        Self(hex[..SESSION_ID_LEN].to_string())
    }

    /// Wrap an id received from outside (bookmark, CLI argument).
    ///
    /// Returns `None` unless the value is exactly 12 lowercase hex characters,
    /// which also keeps it safe to use as a directory name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = raw.len() == SESSION_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted bookmark for a session, enough to rebuild its worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub session_id: SessionId,
    pub music_ref: String,
    pub speech_ref: String,
    pub created_at: DateTime<Utc>,
}

impl SessionMeta {
    pub fn new(music_ref: impl Into<String>, speech_ref: impl Into<String>) -> Self {
        let music_ref = music_ref.into();
        let speech_ref = speech_ref.into();
        Self {
            session_id: SessionId::from_playlists(&music_ref, &speech_ref),
            music_ref,
            speech_ref,
            created_at: Utc::now(),
        }
    }
}

/// One on-disk session as reported by a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub chunk_count: usize,
    pub size_mib: f64,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<SessionMeta>,
}
