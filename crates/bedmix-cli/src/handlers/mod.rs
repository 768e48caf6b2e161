//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Parse/validate CLI-specific input, call the registry, format output.
//!
//! Handlers never touch the storage layout directly; the registry owns it.

pub mod delete;
pub mod play;
pub mod prune;
pub mod resume;
pub mod run;
pub mod sessions;

use bedmix_core::SessionId;

use crate::error::CliError;

/// Parse a session id typed by the user.
pub fn parse_session_id(raw: &str) -> Result<SessionId, CliError> {
    SessionId::parse(raw).ok_or_else(|| CliError::SessionNotFound(raw.trim().to_string()))
}
