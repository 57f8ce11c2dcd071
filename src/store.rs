use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_DIR_NAME: &str = ".plexi";
const HISTORY_LIMIT: usize = 10;

/// One past query, newest entries first in [`StoredConfig::history`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub question: String,
    pub model: String,
    /// Epoch milliseconds at the time the query was dispatched.
    pub timestamp: i64,
}

/// The on-disk configuration document. Field names stay camelCase so the
/// file remains a plain `{"apiKey": ..., "history": [...]}` JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub history: Vec<QueryRecord>,
}

/// Handle to the per-user config file. Commands receive a store explicitly
/// so tests can point one at a scratch directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve the store location: `PLEXI_CONFIG_DIR` override first, then
    /// `~/.plexi`, falling back to the working directory when no home
    /// directory is known.
    pub fn from_settings(settings: &Settings) -> Self {
        if let Some(dir) = &settings.config_dir {
            return Self::new(dir.clone());
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(CONFIG_DIR_NAME))
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Load the configuration. A missing file is an empty configuration; an
    /// unreadable or malformed file is logged and also treated as empty.
    pub fn load(&self) -> StoredConfig {
        let path = self.config_file();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return StoredConfig::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read config file");
                return StoredConfig::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config file is not valid JSON, starting from an empty configuration");
                StoredConfig::default()
            }
        }
    }

    /// Persist the configuration in a single write. Returns whether the
    /// write succeeded; failures are logged, never raised.
    pub fn save(&self, config: &StoredConfig) -> bool {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %err, "failed to create config directory");
            return false;
        }

        let path = self.config_file();
        let json = match serde_json::to_string_pretty(config) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to serialize config");
                return false;
            }
        };

        match fs::write(&path, json) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to write config file");
                false
            }
        }
    }

    /// Prepend a query record and truncate the history to the most recent
    /// [`HISTORY_LIMIT`] entries. Best-effort: a failed save only logs.
    pub fn record_query(&self, question: &str, model: &str) {
        let record = QueryRecord {
            question: question.to_string(),
            model: model.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.record(record);
    }

    fn record(&self, record: QueryRecord) {
        let mut config = self.load();
        config.history.insert(0, record);
        config.history.truncate(HISTORY_LIMIT);
        if self.save(&config) {
            debug!(entries = config.history.len(), "recorded query in history");
        }
    }
}

/// Display form of a secret: first four and last four characters with the
/// middle starred out. Keys too short to keep both ends are fully starred.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}
