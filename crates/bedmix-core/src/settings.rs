//! Settings domain types and validation.
//!
//! This module contains the user-facing mixer settings. These are pure domain
//! types; loading and saving live in [`crate::paths`].

use serde::{Deserialize, Serialize};

/// Default length of one chunk, in seconds (one hour).
pub const DEFAULT_CHUNK_DURATION_SECS: u64 = 3600;

/// Default retention window for idle sessions, in days.
pub const DEFAULT_PRUNE_AGE_DAYS: u32 = 7;

/// Default number of prepared chunks kept ahead of playback.
pub const DEFAULT_LOOKAHEAD_DEPTH: usize = 2;

/// Default per-session cap on final mixes queued or running.
pub const DEFAULT_MAX_FINAL_IN_FLIGHT: usize = 2;

/// Environment override for the chunk duration (seconds).
pub const CHUNK_DURATION_ENV: &str = "BEDMIX_CHUNK_DURATION";

/// Environment override for the prune age (days).
pub const PRUNE_DAYS_ENV: &str = "BEDMIX_PRUNE_DAYS";

/// Application settings structure.
///
/// All fields are optional to support partial files and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MixerSettings {
    /// Target length of one chunk in seconds.
    pub target_chunk_duration_secs: Option<u64>,

    /// Idle sessions older than this many days are pruned.
    pub prune_age_days: Option<u32>,

    /// Prepared chunks kept ahead of the current one (1-4).
    pub lookahead_depth: Option<usize>,

    /// Final mixes a session may have queued or running before new chunks
    /// stay at quick quality.
    pub max_final_in_flight: Option<usize>,

    /// Music playlist used when none is given on the command line.
    pub default_music_playlist: Option<String>,

    /// Speech playlist used when none is given on the command line.
    pub default_speech_playlist: Option<String>,
}

impl MixerSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            target_chunk_duration_secs: Some(DEFAULT_CHUNK_DURATION_SECS),
            prune_age_days: Some(DEFAULT_PRUNE_AGE_DAYS),
            lookahead_depth: Some(DEFAULT_LOOKAHEAD_DEPTH),
            max_final_in_flight: Some(DEFAULT_MAX_FINAL_IN_FLIGHT),
            default_music_playlist: None,
            default_speech_playlist: None,
        }
    }

    #[must_use]
    pub fn effective_chunk_duration_secs(&self) -> u64 {
        self.target_chunk_duration_secs
            .unwrap_or(DEFAULT_CHUNK_DURATION_SECS)
    }

    #[must_use]
    pub fn effective_prune_age_days(&self) -> u32 {
        self.prune_age_days.unwrap_or(DEFAULT_PRUNE_AGE_DAYS)
    }

    #[must_use]
    pub fn effective_lookahead_depth(&self) -> usize {
        self.lookahead_depth.unwrap_or(DEFAULT_LOOKAHEAD_DEPTH)
    }

    #[must_use]
    pub fn effective_max_final_in_flight(&self) -> usize {
        self.max_final_in_flight
            .unwrap_or(DEFAULT_MAX_FINAL_IN_FLIGHT)
    }

    /// Apply environment overrides on top of file settings.
    ///
    /// Unparseable values are ignored so a typo never prevents startup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secs) = lookup(CHUNK_DURATION_ENV).and_then(|v| v.trim().parse().ok()) {
            self.target_chunk_duration_secs = Some(secs);
        }
        if let Some(days) = lookup(PRUNE_DAYS_ENV).and_then(|v| v.trim().parse().ok()) {
            self.prune_age_days = Some(days);
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Chunk duration must be between 60 and 86400 seconds, got {0}")]
    InvalidChunkDuration(u64),

    #[error("Prune age must be at least 1 day, got {0}")]
    InvalidPruneAge(u32),

    #[error("Lookahead depth must be between 1 and 4, got {0}")]
    InvalidLookaheadDepth(usize),

    #[error("Final mix cap must be at least 1, got {0}")]
    InvalidFinalCap(usize),
}

/// Validate settings values.
pub fn validate_settings(settings: &MixerSettings) -> Result<(), SettingsError> {
    if let Some(secs) = settings.target_chunk_duration_secs {
        if !(60..=86_400).contains(&secs) {
            return Err(SettingsError::InvalidChunkDuration(secs));
        }
    }

    if let Some(days) = settings.prune_age_days {
        if days == 0 {
            return Err(SettingsError::InvalidPruneAge(days));
        }
    }

    if let Some(depth) = settings.lookahead_depth {
        if !(1..=4).contains(&depth) {
            return Err(SettingsError::InvalidLookaheadDepth(depth));
        }
    }

    if let Some(cap) = settings.max_final_in_flight {
        if cap == 0 {
            return Err(SettingsError::InvalidFinalCap(cap));
        }
    }

    Ok(())
}
