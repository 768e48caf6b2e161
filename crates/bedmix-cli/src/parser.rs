//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the bedmix chunk mixer.
#[derive(Parser)]
#[command(name = "bedmix")]
#[command(about = "Mix a music playlist under a speech playlist, one chunk at a time")]
#[command(version)]
pub struct Cli {
    /// Override the data directory for this invocation
    #[arg(long = "data-dir", global = true, env = "BEDMIX_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["bedmix", "--verbose", "--data-dir", "/tmp/bm", "sessions"]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/bm")));
        assert!(matches!(cli.command, Some(Commands::Sessions)));
    }

    #[test]
    fn test_run_takes_both_playlists() {
        let cli = Cli::parse_from(["bedmix", "run", "--music", "PLm", "--speech", "PLs"]);
        match cli.command {
            Some(Commands::Run { music, speech }) => {
                assert_eq!(music.as_deref(), Some("PLm"));
                assert_eq!(speech.as_deref(), Some("PLs"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_delete_requires_session_id() {
        assert!(Cli::try_parse_from(["bedmix", "delete"]).is_err());
    }
}
