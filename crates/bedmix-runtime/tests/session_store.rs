//! Bookmark persistence through the public store API.

use bedmix_core::{SessionId, SessionMeta, SessionStorePort, StorageLayout};
use bedmix_runtime::{JsonSessionStore, SESSION_FILE};
use chrono::Utc;
use tempfile::TempDir;

#[tokio::test]
async fn test_bookmark_lives_in_chunk_dir() {
    let temp = TempDir::new().unwrap();
    let layout = StorageLayout::new(temp.path());
    let store = JsonSessionStore::new(layout.clone());

    let before = Utc::now();
    let meta = SessionMeta::new("PLmusic", "https://www.youtube.com/playlist?list=PLtalk");
    store.save(&meta).await.unwrap();

    let file = layout.chunk_dir(&meta.session_id).join(SESSION_FILE);
    assert!(file.exists());

    let loaded = store.load(&meta.session_id).await.unwrap().unwrap();
    assert_eq!(loaded, meta);
    assert!(loaded.created_at >= before);
}

#[tokio::test]
async fn test_save_overwrites_previous_bookmark() {
    let temp = TempDir::new().unwrap();
    let store = JsonSessionStore::new(StorageLayout::new(temp.path()));

    let first = SessionMeta::new("a", "b");
    store.save(&first).await.unwrap();
    let mut second = first.clone();
    second.created_at = Utc::now();
    store.save(&second).await.unwrap();

    let id = SessionId::from_playlists("a", "b");
    assert_eq!(store.load(&id).await.unwrap(), Some(second));
}
