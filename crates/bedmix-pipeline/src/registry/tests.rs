use std::sync::Arc;
use std::time::Duration;

use bedmix_core::{MixerError, SessionId};
use chrono::Utc;

use super::*;
use crate::PipelineConfig;
use crate::test_support::{FakeTranscoder, Fixture, MUSIC, MemoryStore, SPEECH, fast_config};

fn registry(fx: &Fixture) -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new(
        fx.layout.clone(),
        fx.deps(),
        Arc::new(MemoryStore::default()),
    ))
}

async fn wait_for_chunk(worker: &ChunkWorker) {
    for _ in 0..400 {
        if !worker.peek_lookahead().await.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no chunk was prepared");
}

#[tokio::test]
async fn test_same_pair_returns_running_worker() {
    let fx = Fixture::new(FakeTranscoder::new());
    let reg = registry(&fx);

    let first = reg.get_or_create(MUSIC, SPEECH).await.unwrap();
    let again = reg.get_or_create(MUSIC, SPEECH).await.unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(
        reg.active_id().await,
        Some(SessionId::from_playlists(MUSIC, SPEECH))
    );
    reg.shutdown().await;
}

#[tokio::test]
async fn test_switch_keeps_chunks_and_drops_raw_cache() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.script_both(2, 150.0);
    let reg = registry(&fx);

    let old = reg.get_or_create(MUSIC, SPEECH).await.unwrap();
    wait_for_chunk(&old).await;
    let old_id = old.session_id().clone();
    std::fs::write(fx.layout.raw_audio_dir(&old_id).join("leftover.mp3"), b"1").unwrap();

    let new = reg.get_or_create("PLother", "PLother-speech").await.unwrap();

    assert_ne!(new.session_id(), &old_id);
    assert!(!old.status().await.running);
    assert!(!fx.layout.raw_audio_dir(&old_id).exists());
    assert!(fx.layout.chunk_dir(&old_id).exists());
    assert_eq!(reg.active_id().await.as_ref(), Some(new.session_id()));
    reg.shutdown().await;
}

#[tokio::test]
async fn test_switch_back_waits_for_stopped_worker() {
    let config = PipelineConfig {
        stop_timeout: Duration::from_millis(50),
        ..fast_config()
    };
    let fx = Fixture::with_config(FakeTranscoder::with_delay(Duration::from_millis(300)), config);
    fx.script_both(2, 150.0);
    let reg = registry(&fx);

    let old = reg.get_or_create(MUSIC, SPEECH).await.unwrap();
    wait_for_chunk(&old).await;
    let old_head = old.peek_lookahead().await[0].clone();

    reg.get_or_create("PLother", "PLother-speech").await.unwrap();
    assert!(!old.is_finished());

    let new = reg.get_or_create(MUSIC, SPEECH).await.unwrap();
    assert!(old.is_finished());
    assert!(!Arc::ptr_eq(&old, &new));

    wait_for_chunk(&new).await;
    let new_head = new.peek_lookahead().await[0].clone();
    assert!(new_head.index > old_head.index);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let head = new.peek_lookahead().await[0].clone();
    assert_eq!(head.index, new_head.index);
    assert!(head.path.exists());
    reg.shutdown().await;
}

#[tokio::test]
async fn test_delete_waits_for_stopped_worker() {
    let config = PipelineConfig {
        stop_timeout: Duration::from_millis(50),
        ..fast_config()
    };
    let fx = Fixture::with_config(FakeTranscoder::with_delay(Duration::from_millis(300)), config);
    fx.script_both(2, 150.0);
    let reg = registry(&fx);
    let worker = reg.get_or_create(MUSIC, SPEECH).await.unwrap();
    wait_for_chunk(&worker).await;
    let id = worker.session_id().clone();

    reg.delete(&id).await;

    assert!(worker.is_finished());
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!fx.layout.chunk_dir(&id).exists());
}

#[tokio::test]
async fn test_delete_removes_everything() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.script_both(1, 150.0);
    let reg = registry(&fx);
    let worker = reg.get_or_create(MUSIC, SPEECH).await.unwrap();
    wait_for_chunk(&worker).await;
    let id = worker.session_id().clone();

    reg.delete(&id).await;

    assert!(!fx.layout.chunk_dir(&id).exists());
    assert!(!fx.layout.raw_audio_dir(&id).exists());
    assert!(reg.active().await.is_none());
    assert_eq!(
        reg.worker(&id).await.unwrap_err(),
        MixerError::SessionNotFound {
            session_id: id.to_string()
        }
    );
}

#[tokio::test]
async fn test_resume_continues_after_retained_chunks() {
    let fx = Fixture::new(FakeTranscoder::new());
    fx.script_both(1, 150.0);
    let id = SessionId::from_playlists(MUSIC, SPEECH);
    let chunk_dir = fx.layout.chunk_dir(&id);
    std::fs::create_dir_all(&chunk_dir).unwrap();
    std::fs::write(chunk_dir.join("3.mp3"), b"final").unwrap();
    let reg = registry(&fx);

    let worker = reg.get_or_create(MUSIC, SPEECH).await.unwrap();
    wait_for_chunk(&worker).await;

    assert_eq!(worker.peek_lookahead().await[0].index, 4);
    assert!(chunk_dir.join("3.mp3").exists());
    reg.shutdown().await;
}

#[tokio::test]
async fn test_load_session_uses_saved_bookmark() {
    let fx = Fixture::new(FakeTranscoder::new());
    let reg = registry(&fx);
    let id = reg.get_or_create(MUSIC, SPEECH).await.unwrap().session_id().clone();
    reg.get_or_create("PLother", "PLother-speech").await.unwrap();

    let restored = reg.load_session(&id).await.unwrap();
    assert_eq!(restored.session_id(), &id);

    let unknown = SessionId::parse("0123456789ab").unwrap();
    assert!(matches!(
        reg.load_session(&unknown).await,
        Err(MixerError::SessionNotFound { .. })
    ));
    reg.shutdown().await;
}

#[tokio::test]
async fn test_list_sessions_reports_usage() {
    let fx = Fixture::new(FakeTranscoder::new());
    let reg = registry(&fx);
    let active = reg.get_or_create(MUSIC, SPEECH).await.unwrap();

    let idle = SessionId::from_playlists("a", "b");
    let idle_dir = fx.layout.chunk_dir(&idle);
    std::fs::create_dir_all(&idle_dir).unwrap();
    std::fs::write(idle_dir.join("1.mp3"), vec![0u8; 1024 * 1024]).unwrap();
    std::fs::write(idle_dir.join("2_quick.mp3"), vec![0u8; 1024 * 1024]).unwrap();
    std::fs::write(idle_dir.join("session.json"), b"{}").unwrap();
    std::fs::create_dir_all(fx.layout.chunk_root().join("not-a-session")).unwrap();

    let sessions = reg.list_sessions().await.unwrap();

    assert_eq!(sessions.len(), 2);
    let idle_summary = sessions.iter().find(|s| s.session_id == idle).unwrap();
    assert_eq!(idle_summary.chunk_count, 2);
    assert!((idle_summary.size_mib - 2.0).abs() < 1e-9);
    assert!(!idle_summary.active);
    assert!(idle_summary.meta.is_none());

    let active_summary = sessions
        .iter()
        .find(|s| &s.session_id == active.session_id())
        .unwrap();
    assert!(active_summary.active);
    assert!(active_summary.meta.is_some());
    reg.shutdown().await;
}

#[tokio::test]
async fn test_prune_skips_active_and_recent_sessions() {
    let fx = Fixture::new(FakeTranscoder::new());
    let reg = registry(&fx);
    let active = reg.get_or_create(MUSIC, SPEECH).await.unwrap();
    let stale = SessionId::from_playlists("old", "pair");
    std::fs::create_dir_all(fx.layout.chunk_dir(&stale)).unwrap();
    std::fs::create_dir_all(fx.layout.raw_audio_dir(&stale)).unwrap();

    assert!(reg.prune_idle().await.unwrap().is_empty());

    let later = Utc::now() + chrono::Duration::days(8);
    let pruned = reg.prune_idle_at(later).await.unwrap();

    assert_eq!(pruned, vec![stale.clone()]);
    assert!(!fx.layout.chunk_dir(&stale).exists());
    assert!(!fx.layout.raw_audio_dir(&stale).exists());
    assert!(fx.layout.chunk_dir(active.session_id()).exists());
    reg.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_maintenance_and_worker() {
    let fx = Fixture::new(FakeTranscoder::new());
    let reg = registry(&fx);
    reg.start_maintenance().await;
    reg.start_maintenance().await;
    let worker = reg.get_or_create(MUSIC, SPEECH).await.unwrap();

    reg.shutdown().await;

    assert!(!worker.status().await.running);
    assert!(reg.active().await.is_none());
}
