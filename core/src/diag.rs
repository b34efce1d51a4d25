//! Append-only sink for unattributable lines.
//!
//! Every line the attribution chain gives up on lands here with a
//! reason tag, for offline tuning of the heuristics. The format
//! (`timestamp<TAB>reason<TAB>raw line`) is not a stable contract.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::combat_log::UnattributedReason;

#[derive(Debug, Clone)]
pub struct DiagnosticSink {
    path: PathBuf,
}

impl DiagnosticSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Best-effort append. Failures are logged and swallowed, never
    /// propagated into the classification path.
    pub fn record(&self, at: NaiveDateTime, reason: UnattributedReason, raw_line: &str) {
        let entry = format!(
            "{}\t{}\t{}\n",
            at.format("%Y-%m-%dT%H:%M:%S%.3f"),
            reason.as_str(),
            raw_line
        );
        let result = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(entry.as_bytes()));
        if let Err(err) = result {
            tracing::warn!(path = %self.path.display(), %err, "diagnostic sink append failed");
        }
    }
}
