//! On-disk layout for session storage.
//!
//! ```text
//! <data_root>/
//!   config.json
//!   raw_audio/<session_id>/      downloaded tracks (deleted when a session is swapped out)
//!   mixed_chunks/<session_id>/   mixed chunk files + session.json (kept for resumption)
//! ```

use std::path::{Path, PathBuf};

use crate::domain::SessionId;

/// Name of the raw audio directory under the data root.
pub const RAW_AUDIO_DIR: &str = "raw_audio";

/// Name of the mixed chunk directory under the data root.
pub const CHUNK_DIR: &str = "mixed_chunks";

/// Name of the settings file under the data root.
pub const CONFIG_FILE: &str = "config.json";

/// Resolved storage locations rooted at one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every session's raw audio.
    pub fn raw_audio_root(&self) -> PathBuf {
        self.root.join(RAW_AUDIO_DIR)
    }

    /// Directory holding every session's mixed chunks.
    pub fn chunk_root(&self) -> PathBuf {
        self.root.join(CHUNK_DIR)
    }

    /// Raw audio directory for one session.
    pub fn raw_audio_dir(&self, session: &SessionId) -> PathBuf {
        self.raw_audio_root().join(session.as_str())
    }

    /// Chunk directory for one session.
    pub fn chunk_dir(&self, session: &SessionId) -> PathBuf {
        self.chunk_root().join(session.as_str())
    }

    /// Path of the settings file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}
