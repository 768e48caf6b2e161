//! Run command handler.
//!
//! Starts (or rejoins) the session for a playlist pair and hands over to the
//! interactive player.

use anyhow::Result;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::play;

/// Pick the playlist from the command line, falling back to the configured default.
pub fn resolve_playlist(
    arg: Option<String>,
    default: Option<&String>,
    label: &str,
) -> Result<String, CliError> {
    arg.or_else(|| default.cloned())
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            CliError::Arguments(format!(
                "no {label} playlist given; pass --{label} or set default_{label}_playlist in config.json"
            ))
        })
}

/// Execute the run command.
pub async fn execute(ctx: &CliContext, music: Option<String>, speech: Option<String>) -> Result<()> {
    let music = resolve_playlist(music, ctx.settings.default_music_playlist.as_ref(), "music")?;
    let speech = resolve_playlist(speech, ctx.settings.default_speech_playlist.as_ref(), "speech")?;

    let worker = ctx
        .registry
        .get_or_create(&music, &speech)
        .await
        .map_err(CliError::from)?;
    info!(session = %worker.session_id(), "Session started");

    play::execute(ctx, &worker).await
}
