//! Storage-only commands work without any external tool installed.

use bedmix_cli::handlers;
use bedmix_cli::{CliConfig, ToolRequirement, bootstrap};
use bedmix_core::SessionId;
use tempfile::TempDir;

#[tokio::test]
async fn test_sessions_delete_prune_on_fresh_root() {
    let temp = TempDir::new().unwrap();
    let config = CliConfig::load(Some(temp.path().to_path_buf())).unwrap();
    let ctx = bootstrap(config, ToolRequirement::NotNeeded).unwrap();

    let id = SessionId::from_playlists("PLmusic", "PLspeech");
    let chunk_dir = ctx.layout.chunk_dir(&id);
    std::fs::create_dir_all(&chunk_dir).unwrap();
    std::fs::write(chunk_dir.join("1_final.mp3"), b"audio").unwrap();

    handlers::sessions::execute(&ctx).await.unwrap();
    handlers::prune::execute(&ctx).await.unwrap();
    assert!(chunk_dir.exists(), "recent sessions survive prune");

    handlers::delete::execute(&ctx, id.as_str()).await.unwrap();
    assert!(!chunk_dir.exists());
    assert!(ctx.registry.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_rejects_malformed_id() {
    let temp = TempDir::new().unwrap();
    let config = CliConfig::load(Some(temp.path().to_path_buf())).unwrap();
    let ctx = bootstrap(config, ToolRequirement::NotNeeded).unwrap();

    let err = handlers::delete::execute(&ctx, "not-an-id").await.unwrap_err();
    let cli_err = err.downcast_ref::<bedmix_cli::CliError>().unwrap();
    assert_eq!(cli_err.exit_code(), 66);
}
