//! History configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default batching window in milliseconds.
pub const DEFAULT_BATCH_WINDOW_MS: u64 = 10;

/// Errors produced while loading a [`HistoryConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid history config: {0}")]
    /// The JSON document could not be parsed.
    Json(#[from] serde_json::Error),
}

/// Tunables of the history engine.
///
/// ```rust
/// use markup_history::HistoryConfig;
///
/// let config = HistoryConfig::from_json(r#"{ "max_history_size": 50 }"#).unwrap();
/// assert_eq!(config.max_history_size, Some(50));
/// assert_eq!(config.batch_window_ms, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Raw changes of the same kind closer together than this are folded into one record.
    /// `0` disables batching.
    pub batch_window_ms: u64,
    /// Maximum number of records kept; `None` keeps everything.
    pub max_history_size: Option<usize>,
}

impl HistoryConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Batching window as a [`Duration`].
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    /// Config with batching disabled: every raw change becomes its own record.
    pub fn unbatched() -> Self {
        Self {
            batch_window_ms: 0,
            ..Self::default()
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            batch_window_ms: DEFAULT_BATCH_WINDOW_MS,
            max_history_size: None,
        }
    }
}
