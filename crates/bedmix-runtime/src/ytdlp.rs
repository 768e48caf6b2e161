//! `TrackSourcePort` backed by the yt-dlp command line.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bedmix_core::{MixerError, PlaylistRef, TrackKind, TrackSourcePort};
use tracing::{debug, info, warn};

use crate::command::{run_captured, tool_command};

/// Downloads at or below this size are treated as corrupt.
pub const MIN_DOWNLOAD_BYTES: u64 = 1024;

pub struct YtDlpSource {
    binary: PathBuf,
}

impl YtDlpSource {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

/// Arguments listing up to `max_items` ids of a playlist without downloading.
pub fn resolve_args(playlist: &PlaylistRef, max_items: usize) -> Vec<String> {
    vec![
        "--flat-playlist".into(),
        "--quiet".into(),
        "--no-warnings".into(),
        "--print".into(),
        "id".into(),
        "--playlist-end".into(),
        max_items.to_string(),
        playlist.url().to_string(),
    ]
}

/// Arguments downloading one item as 128k mp3 to `<template>.mp3`.
pub fn download_args(item_id: &str, template: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--format",
        "bestaudio/best",
        "--extract-audio",
        "--audio-format",
        "mp3",
        "--audio-quality",
        "128K",
        "--no-playlist",
        "--quiet",
        "--no-warnings",
        "--output",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(template.into());
    args.push(format!("https://www.youtube.com/watch?v={item_id}").into());
    args
}

/// Non-empty trimmed lines of yt-dlp's `--print id` output.
pub fn parse_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Where an item of `kind` is stored: `<dest>/<kind>_<id>.mp3`.
pub fn track_path(dest_dir: &Path, kind: TrackKind, item_id: &str) -> PathBuf {
    dest_dir.join(format!("{kind}_{item_id}.mp3"))
}

#[async_trait]
impl TrackSourcePort for YtDlpSource {
    async fn resolve_playlist(&self, playlist: &PlaylistRef, max_items: usize) -> Vec<String> {
        let cmd = tool_command(&self.binary, resolve_args(playlist, max_items));
        match run_captured(cmd).await {
            Ok(output) => {
                let ids = parse_ids(&String::from_utf8_lossy(&output.stdout));
                info!(playlist = %playlist, count = ids.len(), "Resolved playlist");
                ids
            }
            Err(failure) => {
                let error = MixerError::ResolutionFailure {
                    playlist: playlist.url().to_string(),
                    message: failure.to_string(),
                };
                warn!(%error, "Playlist resolution failed");
                Vec::new()
            }
        }
    }

    async fn fetch_audio(
        &self,
        item_id: &str,
        kind: TrackKind,
        dest_dir: &Path,
    ) -> Result<PathBuf, MixerError> {
        let output = track_path(dest_dir, kind, item_id);
        // yt-dlp appends the extension itself after extraction
        let template = output.with_extension("%(ext)s");

        debug!(item = item_id, %kind, "Downloading track");
        run_captured(tool_command(&self.binary, download_args(item_id, &template)))
            .await
            .map_err(|failure| MixerError::FetchFailure {
                item_id: item_id.to_string(),
                message: failure.to_string(),
            })?;

        let bytes = tokio::fs::metadata(&output).await.map_or(0, |m| m.len());
        if bytes <= MIN_DOWNLOAD_BYTES {
            if bytes > 0 {
                if let Err(e) = tokio::fs::remove_file(&output).await {
                    warn!(path = %output.display(), error = %e, "Failed to remove corrupt download");
                }
            }
            return Err(MixerError::CorruptDownload {
                item_id: item_id.to_string(),
                bytes,
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_args_use_normalized_url() {
        let args = resolve_args(&PlaylistRef::new("PLabc&si=xyz"), 50);
        assert_eq!(args[..5], ["--flat-playlist", "--quiet", "--no-warnings", "--print", "id"]);
        assert_eq!(args[5..7], ["--playlist-end", "50"]);
        assert_eq!(args[7], "https://www.youtube.com/playlist?list=PLabc");
    }

    #[test]
    fn test_download_args_target_single_video() {
        let args = download_args("dQw4w9WgXcQ", Path::new("/r/music_dQw4w9WgXcQ.%(ext)s"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.windows(2).any(|w| w == ["--audio-format", "mp3"]));
        assert_eq!(args[args.len() - 2], "/r/music_dQw4w9WgXcQ.%(ext)s");
        assert_eq!(
            args[args.len() - 1],
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_parse_ids_skips_blank_lines() {
        assert_eq!(parse_ids("abc\n\n  def  \n"), ["abc", "def"]);
        assert!(parse_ids("").is_empty());
    }

    #[test]
    fn test_track_path_names_by_kind() {
        assert_eq!(
            track_path(Path::new("/r"), TrackKind::Speech, "x1"),
            PathBuf::from("/r/speech_x1.mp3")
        );
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("yt-dlp");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_resolve_reads_printed_ids() {
            let temp = TempDir::new().unwrap();
            let source = YtDlpSource::new(script(temp.path(), "printf 'a1\\nb2\\n'"));

            let ids = source.resolve_playlist(&PlaylistRef::new("PLx"), 50).await;
            assert_eq!(ids, ["a1", "b2"]);
        }

        #[tokio::test]
        async fn test_resolve_failure_is_empty() {
            let temp = TempDir::new().unwrap();
            let source = YtDlpSource::new(script(temp.path(), "exit 1"));

            assert!(source.resolve_playlist(&PlaylistRef::new("PLx"), 50).await.is_empty());
        }

        #[tokio::test]
        async fn test_tiny_download_is_corrupt() {
            let temp = TempDir::new().unwrap();
            let dest = temp.path().join("raw");
            fs::create_dir_all(&dest).unwrap();
            // Writes a 10-byte file where the real tool would put the mp3
            let body = format!("printf 'tiny file!' > '{}'", dest.join("music_v1.mp3").display());
            let source = YtDlpSource::new(script(temp.path(), &body));

            let err = source
                .fetch_audio("v1", TrackKind::Music, &dest)
                .await
                .unwrap_err();
            assert_eq!(
                err,
                MixerError::CorruptDownload {
                    item_id: "v1".to_string(),
                    bytes: 10
                }
            );
            assert!(!dest.join("music_v1.mp3").exists());
        }

        #[tokio::test]
        async fn test_failed_download_is_fetch_failure() {
            let temp = TempDir::new().unwrap();
            let source = YtDlpSource::new(script(temp.path(), "echo 'Video unavailable' >&2; exit 1"));

            let err = source
                .fetch_audio("gone", TrackKind::Speech, temp.path())
                .await
                .unwrap_err();
            assert!(matches!(err, MixerError::FetchFailure { ref message, .. } if message.contains("Video unavailable")));
        }
    }
}
