//! Configuration for notes-bible
//!
//! Settings are grouped per concern and can be loaded from a JSON file.
//! Every section has sensible defaults so `Config::default()` is usable as-is.

use crate::error::{BibleError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest chunk accepted for multi-row verse inserts. Six bound parameters per
/// row keeps this well under SQLite's host parameter limit.
pub const MAX_INSERT_BATCH_SIZE: usize = 5000;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub network: NetworkConfig,
    pub events: EventConfig,
}

/// Local store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,

    /// Rows per multi-row verse insert statement
    pub insert_batch_size: usize,

    /// How long SQLite waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("notesbible.db"),
            insert_batch_size: 500,
            busy_timeout_ms: 5000,
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: format!("notes-bible/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Invalidation bus settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventConfig {
    /// Buffered invalidations per subscriber before it is considered lagged
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BibleError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;

        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let batch = self.database.insert_batch_size;
        if batch == 0 || batch > MAX_INSERT_BATCH_SIZE {
            return Err(BibleError::Config(format!(
                "insert_batch_size must be between 1 and {}, got {}",
                MAX_INSERT_BATCH_SIZE, batch
            )));
        }

        if self.network.timeout_secs == 0 {
            return Err(BibleError::Config(
                "network timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(BibleError::Config(
                "events channel_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
