//! Chunk, tier and progress types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Quality tier of a mixed chunk.
///
/// Ordering follows upgrade order: `Immediate < Quick < Final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixTier {
    Immediate,
    Quick,
    Final,
}

impl MixTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Quick => "quick",
            Self::Final => "final",
        }
    }

    /// File name of this tier's output for chunk `index`.
    ///
    /// The final tier owns the plain `<index>.mp3` name.
    #[must_use]
    pub fn file_name(self, index: u64) -> String {
        match self {
            Self::Immediate => format!("{index}_immediate.mp3"),
            Self::Quick => format!("{index}_quick.mp3"),
            Self::Final => format!("{index}.mp3"),
        }
    }

    /// The tier that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Immediate => Some(Self::Quick),
            Self::Quick => Some(Self::Final),
            Self::Final => None,
        }
    }
}

impl fmt::Display for MixTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage of one chunk.
///
/// `Failed` is reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixStage {
    Collecting,
    Concatenating,
    ImmediateMix,
    ImmediateReady,
    QuickMix,
    QuickReady,
    FinalMix,
    FinalReady,
    Failed,
}

impl MixStage {
    /// Stage entered while `tier` is being mixed.
    #[must_use]
    pub const fn mixing(tier: MixTier) -> Self {
        match tier {
            MixTier::Immediate => Self::ImmediateMix,
            MixTier::Quick => Self::QuickMix,
            MixTier::Final => Self::FinalMix,
        }
    }

    /// Stage reached once `tier` is in place.
    #[must_use]
    pub const fn ready(tier: MixTier) -> Self {
        match tier {
            MixTier::Immediate => Self::ImmediateReady,
            MixTier::Quick => Self::QuickReady,
            MixTier::Final => Self::FinalReady,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::FinalReady | Self::Failed)
    }
}

/// Progress of one chunk, keyed by index in the session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub stage: MixStage,
    /// 0-100.
    pub percent: u8,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(stage: MixStage, percent: u8) -> Self {
        Self {
            stage,
            percent: percent.min(100),
            updated_at: Utc::now(),
        }
    }
}

/// A playable chunk: index, the file currently standing for it and its tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    pub index: u64,
    pub path: PathBuf,
    pub quality: MixTier,
}

impl ChunkDescriptor {
    pub fn new(index: u64, path: impl Into<PathBuf>, quality: MixTier) -> Self {
        Self {
            index,
            path: path.into(),
            quality,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order_follows_upgrade_order() {
        assert!(MixTier::Immediate < MixTier::Quick);
        assert!(MixTier::Quick < MixTier::Final);
        assert_eq!(MixTier::Immediate.next(), Some(MixTier::Quick));
        assert_eq!(MixTier::Final.next(), None);
    }

    #[test]
    fn test_tier_file_names() {
        assert_eq!(MixTier::Immediate.file_name(3), "3_immediate.mp3");
        assert_eq!(MixTier::Quick.file_name(3), "3_quick.mp3");
        assert_eq!(MixTier::Final.file_name(3), "3.mp3");
    }

    #[test]
    fn test_stage_helpers() {
        assert_eq!(MixStage::mixing(MixTier::Quick), MixStage::QuickMix);
        assert_eq!(MixStage::ready(MixTier::Final), MixStage::FinalReady);
        assert!(MixStage::Failed.is_terminal());
        assert!(!MixStage::QuickReady.is_terminal());
    }

    #[test]
    fn test_progress_percent_is_clamped() {
        assert_eq!(ProgressRecord::new(MixStage::FinalMix, 150).percent, 100);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&MixTier::Final).unwrap(), "\"final\"");
        assert_eq!(
            serde_json::to_string(&MixStage::ImmediateReady).unwrap(),
            "\"immediate_ready\""
        );
    }
}
