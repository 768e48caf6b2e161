//! Adapters binding the bedmix ports to real tools.
//!
//! - [`YtDlpSource`]: playlist resolution and audio downloads via `yt-dlp`
//! - [`FfmpegTranscoder`]: probing, concatenation and mixing via `ffprobe`/`ffmpeg`
//! - [`JsonSessionStore`]: session bookmarks as JSON files
//!
//! Tool locations come from [`ToolPaths`], which honors `BEDMIX_FFMPEG`,
//! `BEDMIX_FFPROBE` and `BEDMIX_YTDLP` before searching `PATH`.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use chrono as _;
#[cfg(test)]
use tokio_test as _;

pub mod binaries;
mod command;
pub mod ffmpeg;
pub mod store;
pub mod ytdlp;

pub use binaries::{Tool, ToolError, ToolPaths, resolve_tool};
pub use command::stderr_tail;
pub use ffmpeg::FfmpegTranscoder;
pub use store::{JsonSessionStore, SESSION_FILE};
pub use ytdlp::{MIN_DOWNLOAD_BYTES, YtDlpSource};
