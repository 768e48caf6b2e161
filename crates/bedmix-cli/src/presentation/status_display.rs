//! Worker status rendering for the interactive prompt.

use std::fmt::Write as _;
use std::time::Duration;

use bedmix_core::{MixStage, ProgressRecord, WorkerStatus};

fn stage_label(stage: MixStage) -> &'static str {
    match stage {
        MixStage::Collecting => "collecting",
        MixStage::Concatenating => "concatenating",
        MixStage::ImmediateMix => "immediate mix",
        MixStage::ImmediateReady => "immediate ready",
        MixStage::QuickMix => "quick mix",
        MixStage::QuickReady => "quick ready",
        MixStage::FinalMix => "final mix",
        MixStage::FinalReady => "final ready",
        MixStage::Failed => "failed",
    }
}

/// One progress line, e.g. `final mix 42%`.
pub fn format_progress(record: &ProgressRecord) -> String {
    format!("{} {}%", stage_label(record.stage), record.percent)
}

/// Single line printed while no chunk is ready yet.
pub fn format_waiting(status: &WorkerStatus, elapsed: Duration) -> String {
    let mut out = format!("Still preparing the first chunk ({}s)", elapsed.as_secs());
    if let Some((index, record)) = status.progress.iter().next() {
        let _ = write!(out, ": chunk {index} {}", format_progress(record));
    }
    if let Some(entry) = status.recent_errors.last() {
        let _ = write!(out, " (last error: {})", entry.message);
    }
    out
}

/// Multi-line status block printed by the `status` prompt command.
pub fn format_status(status: &WorkerStatus) -> String {
    let mut out = String::new();
    let state = if status.running { "running" } else { "stopped" };
    let _ = writeln!(out, "Session {} ({state})", status.session_id);

    match &status.current {
        Some(current) => {
            let _ = writeln!(
                out,
                "  Current:   chunk {} [{}] {}",
                current.index,
                current.quality,
                current.path.display()
            );
        }
        None => {
            let _ = writeln!(out, "  Current:   none yet");
        }
    }

    let _ = writeln!(
        out,
        "  Lookahead: {} chunk(s), queues music={} speech={}",
        status.lookahead_count, status.music_queue_len, status.speech_queue_len
    );

    if !status.final_in_flight.is_empty() {
        let indices: Vec<String> = status
            .final_in_flight
            .iter()
            .map(ToString::to_string)
            .collect();
        let _ = writeln!(out, "  Final mix: chunk(s) {}", indices.join(", "));
    }

    for (index, record) in &status.progress {
        let _ = writeln!(out, "  Chunk {index}: {}", format_progress(record));
    }

    if !status.recent_errors.is_empty() {
        let _ = writeln!(out, "  Recent errors:");
        for entry in &status.recent_errors {
            let _ = writeln!(
                out,
                "    {} {}",
                entry.at.format("%H:%M:%S"),
                entry.message
            );
        }
    }

    out
}
