//! Sessions command handler.
//!
//! Displays every session found on disk in a formatted table.

use anyhow::Result;

use bedmix_core::SessionSummary;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{print_separator, truncate_string};

fn format_row(summary: &SessionSummary) -> String {
    let (created, music, speech) = summary.meta.as_ref().map_or_else(
        || ("--".to_string(), "--".to_string(), "--".to_string()),
        |meta| {
            (
                meta.created_at.format("%Y-%m-%d %H:%M").to_string(),
                truncate_string(&meta.music_ref, 24),
                truncate_string(&meta.speech_ref, 24),
            )
        },
    );
    let marker = if summary.active { "*" } else { " " };

    format!(
        "{marker} {:<12} {:>6} {:>9.1} {:<16} {:<24} {}",
        summary.session_id, summary.chunk_count, summary.size_mib, created, music, speech
    )
}

/// Execute the sessions command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let sessions = ctx.registry.list_sessions().await.map_err(CliError::from)?;

    if sessions.is_empty() {
        println!("No sessions found under {}.", ctx.layout.root().display());
        println!("Use 'bedmix run --music <playlist> --speech <playlist>' to start one.");
        return Ok(());
    }

    println!("Found {} session(s):\n", sessions.len());
    println!(
        "  {:<12} {:>6} {:>9} {:<16} {:<24} Speech",
        "Session", "Chunks", "Size MiB", "Created", "Music"
    );
    print_separator(100);

    for summary in &sessions {
        println!("{}", format_row(summary));
    }

    Ok(())
}
