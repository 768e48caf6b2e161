//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the pipeline expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process or filesystem details in any signature beyond plain paths
//! - Intent-based methods (resolve, fetch, mix), not tool flags

pub mod session_store;
pub mod track_source;
pub mod transcoder;

use thiserror::Error;

pub use session_store::SessionStorePort;
pub use track_source::TrackSourcePort;
pub use transcoder::{MixJob, TranscoderPort};

/// Domain-specific errors for repository operations.
///
/// Abstracts away storage details so callers handle persistence failures
/// without knowing the backing format.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (filesystem).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
