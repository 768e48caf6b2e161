//! `TranscoderPort` backed by ffmpeg and ffprobe.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bedmix_core::{MixJob, TranscodeFailure, TranscoderPort};
use tracing::{debug, warn};

use crate::command::{run_captured, tool_command};

/// Output codec settings shared by every mix tier.
const MP3_CODEC: [&str; 4] = ["-c:a", "libmp3lame", "-b:a", "128k"];

pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

/// ffprobe arguments printing only the container duration.
pub fn probe_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(path.into());
    args
}

/// ffmpeg arguments for a stream-copy concatenation driven by `list_file`.
pub fn concat_args(list_file: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-y", "-f", "concat", "-safe", "0", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(list_file.into());
    args.extend(["-c", "copy"].map(OsString::from));
    args.push(output.into());
    args
}

/// ffmpeg arguments for one mix tier.
pub fn mix_args(job: &MixJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-nostdin".into(), "-y".into()];
    for input in &job.inputs {
        args.push("-i".into());
        args.push(input.into());
    }
    args.push("-filter_complex".into());
    args.push(job.filter_graph.clone().into());
    args.extend(["-map", "[out]"].map(OsString::from));
    args.extend(MP3_CODEC.map(OsString::from));
    args.push(job.output.clone().into());
    args
}

/// Contents of a concat demuxer list file.
///
/// Single quotes in paths are closed, escaped and reopened.
pub fn concat_list(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

/// Path of the list file written next to `output`.
fn list_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map_or_else(|| "concat".into(), |s| s.to_string_lossy().into_owned());
    output.with_file_name(format!("{stem}_list.txt"))
}

#[async_trait]
impl TranscoderPort for FfmpegTranscoder {
    async fn probe_duration(&self, path: &Path) -> f64 {
        let cmd = tool_command(&self.ffprobe, probe_args(path));
        match run_captured(cmd).await {
            Ok(output) => String::from_utf8_lossy(&output.stdout)
                .trim()
                .parse()
                .unwrap_or(0.0),
            Err(failure) => {
                warn!(path = %path.display(), %failure, "Duration probe failed");
                0.0
            }
        }
    }

    async fn concatenate(
        &self,
        inputs: &[PathBuf],
        output: &Path,
    ) -> Result<(), TranscodeFailure> {
        if inputs.is_empty() {
            return Err(TranscodeFailure::new(None, "no inputs to concatenate"));
        }

        let absolute: Vec<PathBuf> = inputs
            .iter()
            .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
            .collect();
        let list_file = list_path(output);
        tokio::fs::write(&list_file, concat_list(&absolute))
            .await
            .map_err(|e| TranscodeFailure::new(None, format!("failed to write concat list: {e}")))?;

        let result = run_captured(tool_command(&self.ffmpeg, concat_args(&list_file, output))).await;
        if let Err(e) = tokio::fs::remove_file(&list_file).await {
            debug!(path = %list_file.display(), error = %e, "Concat list already gone");
        }
        result.map(|_| ())
    }

    async fn mix(&self, job: &MixJob) -> Result<(), TranscodeFailure> {
        debug!(tier = %job.tier, output = %job.output.display(), "Starting mix");
        run_captured(tool_command(&self.ffmpeg, mix_args(job)))
            .await
            .map(|_| ())
    }
}
