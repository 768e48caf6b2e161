//! Session bookmark persistence port.
//!
//! Bookmarks let a session be resumed by id after its worker was torn down.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{SessionId, SessionMeta};

/// Port for persisting session metadata.
#[async_trait]
pub trait SessionStorePort: Send + Sync {
    /// Store (or overwrite) a session's bookmark.
    async fn save(&self, meta: &SessionMeta) -> Result<(), RepositoryError>;

    /// Load a bookmark, `Ok(None)` if the session was never saved.
    async fn load(&self, session_id: &SessionId) -> Result<Option<SessionMeta>, RepositoryError>;
}
