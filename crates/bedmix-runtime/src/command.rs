//! Running external tools and turning their output into failures.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};

use bedmix_core::TranscodeFailure;
use tokio::process::Command;
use tracing::debug;

/// Characters of stderr kept in a failure.
pub const STDERR_TAIL_CHARS: usize = 200;

/// Build a command with piped output and no stdin.
///
/// The child is killed if the future running it is dropped, so a timed-out
/// transcode does not linger.
pub fn tool_command<I, S>(program: &Path, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run `cmd` to completion and capture its output.
///
/// A non-zero exit becomes a [`TranscodeFailure`] carrying the exit status and
/// the tail of stderr.
pub async fn run_captured(mut cmd: Command) -> Result<Output, TranscodeFailure> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    debug!(program = %program, "Running tool");

    let output = cmd
        .output()
        .await
        .map_err(|e| TranscodeFailure::new(None, format!("failed to run {program}: {e}")))?;

    if output.status.success() {
        Ok(output)
    } else {
        Err(TranscodeFailure::new(
            output.status.code(),
            stderr_tail(&output.stderr, STDERR_TAIL_CHARS),
        ))
    }
}

/// Last `max_chars` characters of `stderr`, trimmed.
pub fn stderr_tail(stderr: &[u8], max_chars: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}
