//! Domain types for tracks, chunks and sessions.
//!
//! Pure data types with no I/O dependencies.

pub mod chunk;
pub mod session;
pub mod track;

pub use chunk::{ChunkDescriptor, MixStage, MixTier, ProgressRecord};
pub use session::{SessionId, SessionMeta, SessionSummary};
pub use track::{PlaylistRef, Track, TrackKind, total_duration};
