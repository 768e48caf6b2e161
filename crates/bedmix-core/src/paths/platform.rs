//! Data root resolution.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable that overrides the data root.
pub const DATA_DIR_ENV: &str = "BEDMIX_DATA_DIR";

/// Get the root directory for application data (raw audio, chunks, config).
///
/// Resolution order:
/// 1. `BEDMIX_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/bedmix`)
///
/// The directory is not created here; see [`super::ensure_directory`].
pub fn data_root() -> Result<PathBuf, PathError> {
    resolve_data_root(|key| env::var(key).ok())
}

/// Resolve the data root with an injectable environment lookup.
///
/// Tests use this instead of mutating the process environment.
pub fn resolve_data_root<F>(lookup: F) -> Result<PathBuf, PathError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(DATA_DIR_ENV).filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("bedmix"))
}
