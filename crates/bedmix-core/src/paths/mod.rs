//! Path utilities for bedmix data directories.
//!
//! This module provides the canonical path resolution for all bedmix components:
//! - Data root (env override or platform data dir)
//! - Per-session raw audio and chunk directories
//! - Settings file location and persistence
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately

mod config;
mod ensure;
mod error;
mod layout;
mod platform;

// Error type
pub use error::PathError;

// Data root
pub use platform::{DATA_DIR_ENV, data_root, resolve_data_root};

// Session storage layout
pub use layout::{CHUNK_DIR, CONFIG_FILE, RAW_AUDIO_DIR, StorageLayout};

// Directory operations
pub use ensure::{DirectoryCreationStrategy, ensure_directory, verify_writable};

// Settings persistence
pub use config::{load_settings, save_settings};
