//! Delete command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::handlers::parse_session_id;

/// Execute the delete command.
///
/// Removes the session's chunks, bookmark and downloaded tracks. Deleting an
/// id with nothing on disk is not an error.
pub async fn execute(ctx: &CliContext, session_id: &str) -> Result<()> {
    let session_id = parse_session_id(session_id)?;
    ctx.registry.delete(&session_id).await;
    println!("Deleted session {session_id}");
    Ok(())
}
