//! Resume command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::{parse_session_id, play};

/// Execute the resume command for a bookmarked session.
pub async fn execute(ctx: &CliContext, session_id: &str) -> Result<()> {
    let session_id = parse_session_id(session_id)?;
    let worker = ctx
        .registry
        .load_session(&session_id)
        .await
        .map_err(CliError::from)?;

    println!("Resuming session {session_id}");
    play::execute(ctx, &worker).await
}
