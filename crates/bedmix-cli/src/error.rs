//! CLI-specific error types and mappings.
//!
//! Maps pipeline, tool and configuration errors to exit codes and
//! user-facing messages.

use bedmix_core::{MixerError, PathError, SettingsError};
use bedmix_runtime::ToolError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(String),

    /// Unknown or malformed session id.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or unusable external tool.
    #[error("{0}")]
    Tool(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Pipeline(_) => 1,
            Self::Arguments(_) => 2,       // EX_USAGE
            Self::SessionNotFound(_) => 66, // EX_NOINPUT
            Self::Io(_) => 74,             // EX_IOERR
            Self::Config(_) => 78,         // EX_CONFIG
            Self::Tool(_) => 69,           // EX_UNAVAILABLE
        }
    }
}

impl From<MixerError> for CliError {
    fn from(err: MixerError) -> Self {
        match err {
            MixerError::SessionNotFound { session_id } => Self::SessionNotFound(session_id),
            MixerError::Io { .. } => Self::Io(err.to_string()),
            other => Self::Pipeline(other.to_string()),
        }
    }
}

impl From<ToolError> for CliError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
