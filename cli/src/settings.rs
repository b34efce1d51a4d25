use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const APP_NAME: &str = "pvmeter";

/// Persisted CLI preferences, stored in the platform config directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliSettings {
    /// Log file tailed automatically at startup.
    pub log_path: Option<PathBuf>,
    /// When set, unattributable lines are appended here with a reason
    /// tag.
    pub diagnostic_sink: Option<PathBuf>,
}

impl CliSettings {
    pub fn load() -> Self {
        confy::load(APP_NAME, None).unwrap_or_default()
    }

    pub fn save(&self) {
        if let Err(err) = confy::store(APP_NAME, None, self) {
            tracing::warn!(%err, "failed to save settings");
        }
    }
}
