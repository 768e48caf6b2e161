//! Core domain types, port traits and configuration for bedmix.
//!
//! This crate has no process, network or runtime dependencies. The pipeline
//! (`bedmix-pipeline`) is written against the ports defined here and the
//! adapters (`bedmix-runtime`) implement them.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod mixing;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    ChunkDescriptor, MixStage, MixTier, PlaylistRef, ProgressRecord, SessionId, SessionMeta,
    SessionSummary, Track, TrackKind, total_duration,
};
pub use mixing::{
    ErrorEntry, MixerError, MixerResult, STATUS_ERROR_COUNT, TranscodeFailure, WorkerStatus,
};
pub use ports::{MixJob, RepositoryError, SessionStorePort, TrackSourcePort, TranscoderPort};
pub use settings::{
    CHUNK_DURATION_ENV, DEFAULT_CHUNK_DURATION_SECS, DEFAULT_LOOKAHEAD_DEPTH,
    DEFAULT_MAX_FINAL_IN_FLIGHT, DEFAULT_PRUNE_AGE_DAYS, MixerSettings, PRUNE_DAYS_ENV,
    SettingsError, validate_settings,
};

// Re-export path utilities
pub use paths::{
    CHUNK_DIR, CONFIG_FILE, DATA_DIR_ENV, DirectoryCreationStrategy, PathError, RAW_AUDIO_DIR,
    StorageLayout, data_root, ensure_directory, load_settings, resolve_data_root, save_settings,
    verify_writable,
};
