use std::sync::Arc;

use pvmeter_core::{DiagnosticSink, LogParser, SpellDataError, SpellTable};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::settings::CliSettings;

/// Shared handle to the parser; the tail task and the REPL commands
/// serialize line processing through this lock.
pub type ParserHandle = Arc<Mutex<LogParser>>;

/// Holds all shared state for the CLI application.
#[derive(Clone)]
pub struct CliContext {
    pub settings: Arc<RwLock<CliSettings>>,
    parser: ParserHandle,
    pub tail_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CliContext {
    pub fn new() -> Result<Self, SpellDataError> {
        let settings = CliSettings::load();
        let spells = SpellTable::bundled()?;
        let parser = match &settings.diagnostic_sink {
            Some(path) => LogParser::with_sink(spells, DiagnosticSink::new(path)),
            None => LogParser::new(spells),
        };
        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            parser: Arc::new(Mutex::new(parser)),
            tail_task: Arc::new(Mutex::new(None)),
        })
    }

    pub fn parser(&self) -> ParserHandle {
        Arc::clone(&self.parser)
    }

    /// Stop the running tail task, if any.
    pub async fn stop_tail(&self) {
        if let Some(task) = self.tail_task.lock().await.take() {
            task.abort();
        }
    }
}
