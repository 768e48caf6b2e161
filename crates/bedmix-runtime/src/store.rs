//! Session bookmarks stored as `session.json` inside each chunk directory.
//!
//! Keeping the bookmark with the chunks means deleting or pruning a session
//! removes its metadata too.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bedmix_core::{RepositoryError, SessionId, SessionMeta, SessionStorePort, StorageLayout};
use tracing::debug;

/// File name of the bookmark inside a session's chunk directory.
pub const SESSION_FILE: &str = "session.json";

pub struct JsonSessionStore {
    layout: StorageLayout,
}

impl JsonSessionStore {
    pub const fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    fn path(&self, session_id: &SessionId) -> PathBuf {
        self.layout.chunk_dir(session_id).join(SESSION_FILE)
    }
}

#[async_trait]
impl SessionStorePort for JsonSessionStore {
    async fn save(&self, meta: &SessionMeta) -> Result<(), RepositoryError> {
        let path = self.path(&meta.session_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(meta)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| RepositoryError::Storage(format!("{}: {e}", path.display())))?;

        debug!(session = %meta.session_id, path = %path.display(), "Saved session bookmark");
        Ok(())
    }

    async fn load(&self, session_id: &SessionId) -> Result<Option<SessionMeta>, RepositoryError> {
        let path = self.path(session_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RepositoryError::Storage(format!(
                    "{}: {e}",
                    path.display()
                )));
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| RepositoryError::Serialization(format!("{}: {e}", path.display())))
    }
}
