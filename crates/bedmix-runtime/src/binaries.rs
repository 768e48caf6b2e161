//! Location of the external tools bedmix drives.
//!
//! Each tool is resolved in order:
//! 1. An explicit path from its environment variable (authoritative)
//! 2. The first match on `PATH`

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors raised while locating an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} not found on PATH. Install it or set {env_var} to its location.")]
    NotFound { tool: Tool, env_var: &'static str },

    #[error("{tool} path from {env_var} does not exist: {}", path.display())]
    MissingOverride {
        tool: Tool,
        env_var: &'static str,
        path: PathBuf,
    },

    #[error("{tool} exists but is not executable: {}", path.display())]
    NotExecutable { tool: Tool, path: PathBuf },
}

/// An external program the adapters invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
    YtDlp,
}

impl Tool {
    pub const ALL: [Self; 3] = [Self::Ffmpeg, Self::Ffprobe, Self::YtDlp];

    /// Executable name looked up on `PATH`.
    pub const fn binary_name(self) -> &'static str {
        match self {
            Self::Ffmpeg => "ffmpeg",
            Self::Ffprobe => "ffprobe",
            Self::YtDlp => "yt-dlp",
        }
    }

    /// Environment variable holding an explicit path.
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Ffmpeg => "BEDMIX_FFMPEG",
            Self::Ffprobe => "BEDMIX_FFPROBE",
            Self::YtDlp => "BEDMIX_YTDLP",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// Resolved paths of every tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub ytdlp: PathBuf,
}

impl ToolPaths {
    /// Resolve all tools from the process environment.
    pub fn resolve() -> Result<Self, ToolError> {
        Self::resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve all tools, reading overrides through `lookup`.
    pub fn resolve_with<F>(lookup: F) -> Result<Self, ToolError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            ffmpeg: resolve_tool(Tool::Ffmpeg, &lookup)?,
            ffprobe: resolve_tool(Tool::Ffprobe, &lookup)?,
            ytdlp: resolve_tool(Tool::YtDlp, &lookup)?,
        })
    }
}

/// Resolve one tool: environment override first, then `PATH`.
pub fn resolve_tool<F>(tool: Tool, lookup: &F) -> Result<PathBuf, ToolError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(tool.env_var()).filter(|v| !v.trim().is_empty()) {
        let path = PathBuf::from(raw.trim());
        if !path.exists() {
            return Err(ToolError::MissingOverride {
                tool,
                env_var: tool.env_var(),
                path,
            });
        }
        validate_executable(tool, &path)?;
        debug!(%tool, path = %path.display(), "Using tool from environment");
        return Ok(path);
    }

    let path = which::which(tool.binary_name()).map_err(|_| ToolError::NotFound {
        tool,
        env_var: tool.env_var(),
    })?;
    debug!(%tool, path = %path.display(), "Using tool from PATH");
    Ok(path)
}

fn validate_executable(tool: Tool, path: &Path) -> Result<(), ToolError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let executable = std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false);
        if !executable {
            return Err(ToolError::NotExecutable {
                tool,
                path: path.to_path_buf(),
            });
        }
    }

    #[cfg(not(unix))]
    {
        if !path.is_file() {
            return Err(ToolError::NotExecutable {
                tool,
                path: path.to_path_buf(),
            });
        }
    }

    Ok(())
}
