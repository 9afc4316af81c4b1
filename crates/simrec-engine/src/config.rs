//! Configuration for similarity recomputation
//!
//! Controls whether score changes trigger a recompute, how recomputes are
//! executed, and how dangling item references are handled.

use crate::neighborhood::MissingDataPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A field holds an unusable value
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// How a scheduled recompute is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Run in the caller's control flow before `set_score` returns
    #[default]
    Immediate,

    /// Run on the tokio runtime after a short fixed delay
    Deferred,

    /// Push onto a queue drained by a background worker
    Queue,
}

/// Configuration for the recommender
///
/// # Examples
///
/// ```
/// use simrec_engine::{ExecutionMode, RecommendConfig};
///
/// let config = RecommendConfig::default();
/// assert!(config.enable_autocalc);
/// assert!(!config.purge_missing_data);
/// assert_eq!(config.execution, ExecutionMode::Immediate);
///
/// let config = RecommendConfig::from_toml_str("purge_missing_data = true").unwrap();
/// assert!(config.purge_missing_data);
/// assert!(config.enable_autocalc);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Whether score changes trigger a similarity recompute
    /// Default: true
    #[serde(default = "default_true")]
    pub enable_autocalc: bool,

    /// Purge scores and similarities of items that no longer exist instead
    /// of failing the recompute
    /// Default: false
    #[serde(default)]
    pub purge_missing_data: bool,

    /// Where recomputes run
    /// Default: immediate
    #[serde(default)]
    pub execution: ExecutionMode,

    /// Delay before a deferred recompute starts (in milliseconds), giving the
    /// triggering write time to commit
    /// Default: 1000
    #[serde(default = "default_defer_delay_ms")]
    pub defer_delay_ms: u64,

    /// Default number of results for "similar items" queries
    /// Default: 5
    #[serde(default = "default_similar_items_limit")]
    pub similar_items_limit: usize,
}

fn default_true() -> bool {
    true
}

fn default_defer_delay_ms() -> u64 {
    1000
}

fn default_similar_items_limit() -> usize {
    5
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            enable_autocalc: true,
            purge_missing_data: false,
            execution: ExecutionMode::Immediate,
            defer_delay_ms: default_defer_delay_ms(),
            similar_items_limit: default_similar_items_limit(),
        }
    }
}

impl RecommendConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RecommendConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.similar_items_limit == 0 {
            return Err(ConfigError::Invalid(
                "similar_items_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the deferred execution delay as Duration
    pub fn defer_delay(&self) -> Duration {
        Duration::from_millis(self.defer_delay_ms)
    }

    /// Missing-data policy selected by `purge_missing_data`
    pub fn missing_data_policy(&self) -> MissingDataPolicy {
        if self.purge_missing_data {
            MissingDataPolicy::Purge
        } else {
            MissingDataPolicy::Strict
        }
    }
}
