//! Chunk production pipeline for bedmix.
//!
//! Turns a (music, speech) playlist pair into a stream of mixed chunk files:
//!
//! - [`TrackQueue`] keeps shuffled item ids per track kind
//! - [`ChunkAssembler`] collects tracks to a target duration and builds beds
//! - [`MixUpgrader`] mixes each chunk at immediate, quick and final quality
//! - [`FinalMixGate`] lets one final mix run at a time, process-wide
//! - [`ChunkWorker`] keeps a lookahead buffer of prepared chunks
//! - [`SessionRegistry`] holds the single active session
//!
//! Everything external (playlist resolution, downloads, transcoding, metadata
//! storage) comes in through the port traits of `bedmix-core`.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

pub mod assembler;
pub mod config;
pub mod gate;
pub mod mixer;
pub mod progress;
pub mod queue;
pub mod registry;
pub mod session;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use assembler::{ChunkAssembler, ChunkBeds};
pub use config::{EARLY_STOP_RATIO, MIN_TRACK_SECS, PipelineConfig};
pub use gate::{FinalMixGate, FinalMixPass};
pub use mixer::{MixUpgrader, UpgradeReport, filter_graph};
pub use progress::{ProgressThrottle, estimate_final_percent};
pub use queue::{LOW_WATER_MARK, REFILL_BATCH, TrackQueue, TrackQueues};
pub use registry::SessionRegistry;
pub use session::{SessionContext, SwapOutcome, highest_chunk_index};
pub use worker::{ChunkWorker, PreparedChunk, WorkerDeps};
