//! Query engine configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object
//! is a valid configuration.
//!
//! ```json
//! {
//!   "scans_enabled": false,
//!   "info_command": "sindex-list:",
//!   "index_refresh_interval_secs": 30,
//!   "log_filter": "info",
//!   "log_json": false
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::DEFAULT_INFO_COMMAND;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "AERO_CONFIG_READ",
            ConfigError::Parse { .. } => "AERO_CONFIG_PARSE",
            ConfigError::Invalid(_) => "AERO_CONFIG_INVALID",
        }
    }
}

/// Configuration for the query engine and index refresher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Permit queries that reach the store without any index filter.
    ///
    /// Default is `false`: such queries fail with `UnsafeFullScan`.
    pub scans_enabled: bool,

    /// Info command listing secondary indexes
    pub info_command: String,

    /// Periodic index refresh, in seconds. `None` disables polling; the
    /// cache is then refreshed only at startup and after index DDL.
    pub index_refresh_interval_secs: Option<u64>,

    /// `tracing` filter directive, e.g. `"info"` or `"aeroquery=debug"`
    pub log_filter: String,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            scans_enabled: false,
            info_command: DEFAULT_INFO_COMMAND.to_string(),
            index_refresh_interval_secs: None,
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

impl QueryConfig {
    /// Reads and validates a JSON config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: QueryConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.info_command.trim().is_empty() {
            return Err(ConfigError::Invalid("info_command must not be empty".into()));
        }
        if self.index_refresh_interval_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "index_refresh_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Periodic refresh interval, if polling is enabled
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.index_refresh_interval_secs.map(Duration::from_secs)
    }

    /// Config with unindexed full scans permitted
    pub fn with_scans_enabled(mut self) -> Self {
        self.scans_enabled = true;
        self
    }
}
