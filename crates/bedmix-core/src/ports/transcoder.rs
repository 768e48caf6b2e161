//! Transcoder port definition.
//!
//! The transcoder concatenates beds, runs mix filter graphs and probes
//! durations. Timeouts and progress polling are the caller's concern: the
//! returned futures may be dropped at any point and implementations must
//! stop the underlying work when that happens.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::MixTier;
use crate::mixing::TranscodeFailure;

/// One mix invocation: a tier's filter graph applied to the two beds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixJob {
    pub tier: MixTier,
    pub filter_graph: String,
    /// Inputs in graph order (`[0:a]` is music, `[1:a]` is speech).
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Port for the external audio engine.
#[async_trait]
pub trait TranscoderPort: Send + Sync {
    /// Duration of an audio file in seconds, or `0.0` when it cannot be probed.
    async fn probe_duration(&self, path: &Path) -> f64;

    /// Join `inputs` in order into `output` by stream copy.
    async fn concatenate(&self, inputs: &[PathBuf], output: &Path)
    -> Result<(), TranscodeFailure>;

    /// Run a mix job to completion.
    async fn mix(&self, job: &MixJob) -> Result<(), TranscodeFailure>;
}
