//! Mixing pipeline errors and status types.
//!
//! - `errors` - the pipeline error taxonomy (`MixerError`, `TranscodeFailure`)
//! - `status` - worker status snapshots (`WorkerStatus`, `ErrorEntry`)

pub mod errors;
pub mod status;

pub use errors::{MixerError, MixerResult, TranscodeFailure};
pub use status::{ErrorEntry, STATUS_ERROR_COUNT, WorkerStatus};
