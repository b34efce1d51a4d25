//! Log line sources: full-file replay and live tail.

use std::path::{Path, PathBuf};
use std::time::Instant;

use pvmeter_core::{GameSignal, SignalHandler};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Duration, sleep};

use crate::context::ParserHandle;

const TAIL_SLEEP_DURATION: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct ReplaySummary {
    pub lines: u64,
    pub signals: u64,
    pub elapsed_ms: u128,
}

/// Runs a whole log file through the parser in one pass.
pub async fn replay_file(path: &Path, parser: &ParserHandle) -> Result<ReplaySummary, ReaderError> {
    let started = Instant::now();
    let file = File::open(path).await.map_err(|source| ReaderError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut lines = 0u64;
    let mut signals = 0u64;

    let mut parser = parser.lock().await;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        signals += parser
            .process_line(line.trim_end_matches(['\r', '\n']))
            .len() as u64;
        lines += 1;
    }

    Ok(ReplaySummary {
        lines,
        signals,
        elapsed_ms: started.elapsed().as_millis(),
    })
}

/// Follows a growing log file, feeding complete lines to the parser as
/// they land. Never returns on its own; the caller aborts the task.
pub async fn tail_file(path: PathBuf, parser: ParserHandle) -> Result<(), ReaderError> {
    let file = File::open(&path).await.map_err(|source| ReaderError::Open {
        path: path.clone(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut announcer = TailAnnouncer;

    loop {
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => sleep(TAIL_SLEEP_DURATION).await,
            Ok(_) => {
                // only process complete lines; partial data stays in the
                // buffer and the next read appends to it
                if buf.ends_with(b"\n") {
                    let line = String::from_utf8_lossy(&buf);
                    let raised = parser
                        .lock()
                        .await
                        .process_line(line.trim_end_matches(['\r', '\n']));
                    for signal in &raised {
                        announcer.handle_signal(signal);
                    }
                    buf.clear();
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Logs signals raised while following a live file.
struct TailAnnouncer;

impl SignalHandler for TailAnnouncer {
    fn handle_signal(&mut self, signal: &GameSignal) {
        match signal {
            GameSignal::CombatStarted => tracing::info!("combat started"),
            GameSignal::CombatEnded => tracing::info!("combat ended"),
            GameSignal::PlayerAdded { name } => tracing::info!(%name, "player joined"),
            GameSignal::PlayerRemoved { name } => tracing::info!(%name, "player left"),
            GameSignal::TurnDetected { name } => tracing::info!(%name, "first turn"),
        }
    }
}
