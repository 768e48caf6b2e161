//! Prune command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the prune command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let removed = ctx.registry.prune_idle().await.map_err(CliError::from)?;

    if removed.is_empty() {
        println!(
            "Nothing to prune (sessions idle for more than {} day(s) are removed).",
            ctx.settings.effective_prune_age_days()
        );
        return Ok(());
    }

    println!("Pruned {} idle session(s):", removed.len());
    for id in removed {
        println!("  {id}");
    }
    Ok(())
}
