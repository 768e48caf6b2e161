//! Available commands.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start (or continue) mixing a playlist pair and play chunks interactively
    Run {
        /// Music playlist URL or id (defaults to `default_music_playlist`)
        #[arg(long)]
        music: Option<String>,
        /// Speech playlist URL or id (defaults to `default_speech_playlist`)
        #[arg(long)]
        speech: Option<String>,
    },

    /// Resume a bookmarked session by id
    Resume {
        /// 12-character session id (see `bedmix sessions`)
        session_id: String,
    },

    /// List sessions stored on disk
    Sessions,

    /// Delete a session's chunks and downloaded tracks
    Delete {
        /// 12-character session id
        session_id: String,
    },

    /// Remove sessions idle for longer than the prune age
    Prune,
}
