//! Interactive player shared by `run` and `resume`.
//!
//! Waits for the first chunk with no time limit, printing a progress line
//! now and then. The prompt already accepts `status` and `quit` while
//! waiting. Once a chunk is ready its path is printed and prompt commands
//! are read from stdin until `quit`, end of input or Ctrl-C. The registry is
//! shut down on the way out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bedmix_core::{ChunkDescriptor, MixerError};
use bedmix_pipeline::{ChunkWorker, ProgressThrottle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::info;

use crate::bootstrap::CliContext;
use crate::presentation::{format_status, format_waiting};

/// Interval between checks while waiting for the first chunk.
pub const FIRST_CHUNK_POLL: Duration = Duration::from_millis(500);

/// Minimum time between progress lines while waiting for the first chunk.
pub const WAITING_REPORT_INTERVAL: Duration = Duration::from_secs(15);

const COMMANDS_HELP: &str = "Commands: next, status, current, quit";

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    /// Reprint the current chunk.
    Current,
    Next,
    Status,
    Quit,
    Unknown(String),
}

impl PromptCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "c" | "current" => Self::Current,
            "n" | "next" => Self::Next,
            "s" | "status" => Self::Status,
            "q" | "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Poll `check` every `interval` until it yields a value.
///
/// There is no deadline: the first chunk needs whole tracks downloaded, which
/// can take minutes. While nothing is ready, `report` is called with the time
/// spent so far, at most once per `report_every`.
pub async fn wait_for_first_chunk<T, C, CF, R, RF>(
    mut check: C,
    mut report: R,
    interval: Duration,
    report_every: Duration,
) -> T
where
    C: FnMut() -> CF,
    CF: Future<Output = Option<T>>,
    R: FnMut(Duration) -> RF,
    RF: Future<Output = ()>,
{
    let started = tokio::time::Instant::now();
    let mut throttle = ProgressThrottle::new(report_every);
    loop {
        if let Some(ready) = check().await {
            return ready;
        }
        if throttle.should_emit() {
            report(started.elapsed()).await;
        }
        tokio::time::sleep(interval).await;
    }
}

fn print_chunk(chunk: &ChunkDescriptor) {
    println!(
        "Chunk {} [{}]: {}",
        chunk.index,
        chunk.quality,
        chunk.path.display()
    );
}

/// Handle one prompt command. Returns `false` when the player should exit.
async fn dispatch(worker: &ChunkWorker, command: PromptCommand) -> bool {
    match command {
        PromptCommand::Current => match worker.current_chunk().await {
            Some(chunk) => print_chunk(&chunk),
            None => println!("No chunk ready yet."),
        },
        PromptCommand::Next => match worker.advance().await {
            Ok(chunk) => print_chunk(&chunk),
            Err(MixerError::NoChunkAvailable) => {
                println!("Next chunk not ready yet; try again shortly.");
            }
            Err(e) => println!("Could not advance: {e}"),
        },
        PromptCommand::Status => print!("{}", format_status(&worker.status().await)),
        PromptCommand::Quit => return false,
        PromptCommand::Unknown(other) => {
            println!("Unknown command '{other}'. {COMMANDS_HELP}");
        }
    }
    true
}

/// Answer prompt commands until the user quits. End of input keeps waiting.
async fn prompt_while_waiting<B>(worker: &ChunkWorker, lines: &mut Lines<B>) -> Result<()>
where
    B: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        match PromptCommand::parse(&line) {
            PromptCommand::Quit => return Ok(()),
            PromptCommand::Status => print!("{}", format_status(&worker.status().await)),
            PromptCommand::Current | PromptCommand::Next => {
                println!("No chunk ready yet; still mixing.");
            }
            PromptCommand::Unknown(other) => {
                println!("Unknown command '{other}'. {COMMANDS_HELP}");
            }
        }
    }
    std::future::pending().await
}

async fn prompt_loop<B>(worker: &ChunkWorker, lines: &mut Lines<B>) -> Result<()>
where
    B: AsyncBufRead + Unpin,
{
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !dispatch(worker, PromptCommand::parse(&line)).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

async fn play(worker: &ChunkWorker) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let first = wait_for_first_chunk(
        || worker.current_chunk(),
        |elapsed| async move {
            println!("{}", format_waiting(&worker.status().await, elapsed));
        },
        FIRST_CHUNK_POLL,
        WAITING_REPORT_INTERVAL,
    );
    let chunk = tokio::select! {
        chunk = first => chunk,
        quit = prompt_while_waiting(worker, &mut lines) => {
            info!(session = %worker.session_id(), "Quit before the first chunk was ready");
            return quit;
        }
        _ = tokio::signal::ctrl_c() => return Ok(()),
    };

    print_chunk(&chunk);
    println!("{COMMANDS_HELP}");
    prompt_loop(worker, &mut lines).await
}

/// Run the interactive player for `worker`.
pub async fn execute(ctx: &CliContext, worker: &Arc<ChunkWorker>) -> Result<()> {
    ctx.registry.start_maintenance().await;
    println!(
        "Session {} (waiting for the first chunk; type 'quit' to stop)",
        worker.session_id()
    );

    let result = play(worker).await;

    ctx.registry.shutdown().await;
    result
}
