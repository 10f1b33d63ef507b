//! Query layer configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config contents are not valid
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Whether a pagination limit of zero is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationPolicy {
    /// `limit = 0` is valid and yields an empty page
    AllowZeroLimit,
    /// `limit` must be at least 1
    RequirePositiveLimit,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        PaginationPolicy::RequirePositiveLimit
    }
}

/// Minimum severity written by the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn severity(&self) -> Severity {
        match self {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
        }
    }
}

/// Query layer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Pagination limit rule (default: limit must be positive)
    #[serde(default)]
    pub pagination: PaginationPolicy,

    /// Largest accepted pagination limit (default: unbounded)
    #[serde(default)]
    pub max_limit: Option<u64>,

    /// Reorder filter trees cheapest-first before in-memory evaluation (default: true)
    #[serde(default = "default_optimize_conditions")]
    pub optimize_conditions: bool,

    /// Deadline applied to every execution unless overridden (default: none)
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,

    /// Upper bound on entities drained from a non-native adapter (default: unbounded)
    #[serde(default)]
    pub max_materialized_entities: Option<usize>,

    /// Upper bound on rows before pagination (default: unbounded)
    #[serde(default)]
    pub max_result_rows: Option<usize>,

    /// Minimum log severity (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

fn default_optimize_conditions() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            pagination: PaginationPolicy::default(),
            max_limit: None,
            optimize_conditions: default_optimize_conditions(),
            default_timeout_ms: None,
            max_materialized_entities: None,
            max_result_rows: None,
            log_level: default_log_level(),
        }
    }
}

impl QueryConfig {
    /// Parses a config from a JSON string
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Loads a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().display().to_string();
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        log_event_with_fields(Event::ConfigLoaded, &[("path", path.as_str())]);
        Ok(config)
    }

    /// Sets the pagination policy
    pub fn with_pagination(mut self, policy: PaginationPolicy) -> Self {
        self.pagination = policy;
        self
    }

    /// Sets the default execution deadline
    pub fn with_default_timeout_ms(mut self, ms: u64) -> Self {
        self.default_timeout_ms = Some(ms);
        self
    }

    /// Sets the drain bound for non-native adapters
    pub fn with_max_materialized_entities(mut self, limit: usize) -> Self {
        self.max_materialized_entities = Some(limit);
        self
    }

    /// Sets the result row bound
    pub fn with_max_result_rows(mut self, limit: usize) -> Self {
        self.max_result_rows = Some(limit);
        self
    }

    /// Applies process-wide settings (log level)
    pub fn apply(&self) {
        Logger::set_min_severity(self.log_level.severity());
    }
}
