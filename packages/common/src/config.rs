use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::result::ConfigResult;

pub const DEFAULT_CONFIG_NAME: &str = "deckhand.config.json";

/// Deckhand configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub replication: ReplicationConfig,
}

impl Config {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(cwd: impl AsRef<Path>) -> ConfigResult<Self> {
        let config_path = cwd.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Draft store and history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum history entries kept per slide
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

fn default_history_cap() -> usize {
    50
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_cap: default_history_cap(),
        }
    }
}

/// Deferred replication scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationConfig {
    /// Wait before the first transaction
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Tasks drained per scheduling tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Completion polling interval
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Tables with more rows than this are replicated at low priority
    #[serde(default = "default_heavy_table_rows")]
    pub heavy_table_rows: usize,
}

fn default_settle_delay_ms() -> u64 {
    50
}

fn default_batch_size() -> usize {
    3
}

fn default_batch_delay_ms() -> u64 {
    16
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_heavy_table_rows() -> usize {
    20
}

impl ReplicationConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            heavy_table_rows: default_heavy_table_rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "editor": { "historyCap": 10 },
            "replication": { "batchSize": 5, "settleDelayMs": 0 }
        }"#;

        let config = Config::from_json(json).unwrap();
        assert_eq!(config.editor.history_cap, 10);
        assert_eq!(config.replication.batch_size, 5);
        assert_eq!(config.replication.settle_delay(), Duration::ZERO);
        // Unspecified fields keep their defaults
        assert_eq!(config.replication.heavy_table_rows, 20);
        assert_eq!(config.replication.batch_delay_ms, 16);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor.history_cap, 50);
        assert_eq!(config.replication.batch_size, 3);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "editor": { "historyCap": 3 } }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.editor.history_cap, 3);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(crate::ConfigError::Parse(_))
        ));
    }
}
