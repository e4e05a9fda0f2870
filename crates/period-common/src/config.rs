//! Configuration structures for period numbering.
//!
//! Supports TOML deserialization with defaults suitable for local
//! development. Every key is optional.

use crate::error::{PeriodError, PeriodResult};
use crate::time::DEFAULT_SPAN_MILLIS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server queried when the configured address is empty.
pub const DEFAULT_TIME_SERVER: &str = "pool.ntp.org:123";

/// Top-level period configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodConfig {
    /// Moment period 1 begins (milliseconds since the Unix epoch).
    ///
    /// TOML integers are signed 64-bit, so values above `i64::MAX` can be set
    /// programmatically but fail [`PeriodConfig::to_toml`] and cannot be read
    /// from a file.
    pub origin_timestamp: u64,

    /// Length of every period in milliseconds. Must be non-zero.
    ///
    /// Same `i64::MAX` limit as `origin_timestamp` for TOML files.
    pub span: u64,

    /// Read the local clock only, never the network time source.
    pub test_environment: bool,

    /// Default force policy used when reading the current period.
    pub force: bool,

    /// Network time source configuration.
    pub time_source: TimeSourceConfig,
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            origin_timestamp: 0,
            span: DEFAULT_SPAN_MILLIS,
            test_environment: false,
            force: false,
            time_source: TimeSourceConfig::default(),
        }
    }
}

/// What a forced clock read returns when the network query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForcedFallback {
    /// Read the local wall clock instead.
    #[default]
    LocalClock,
    /// Return whatever the failed query produced, which is the zero time.
    QueryResult,
}

/// Network time source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSourceConfig {
    /// SNTP server (host or host:port). Empty selects [`DEFAULT_TIME_SERVER`].
    pub server: String,

    /// Read timeout for a single query.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Behavior of forced reads after a failed query.
    pub fallback: ForcedFallback,
}

impl Default for TimeSourceConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            timeout: Duration::from_secs(5),
            fallback: ForcedFallback::LocalClock,
        }
    }
}

impl TimeSourceConfig {
    /// Server address with the default host and NTP port filled in.
    #[must_use]
    pub fn server_address(&self) -> String {
        let server = self.server.trim();
        if server.is_empty() {
            DEFAULT_TIME_SERVER.to_string()
        } else if server.parse::<std::net::Ipv6Addr>().is_ok() {
            format!("[{server}]:123")
        } else if server.contains(':') {
            server.to_string()
        } else {
            format!("{server}:123")
        }
    }
}

impl PeriodConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check the values a registry would reject at initialization.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidConfiguration`] for a zero span.
    pub fn validate(&self) -> PeriodResult<()> {
        if self.span == 0 {
            return Err(PeriodError::InvalidConfiguration(
                "period span can't be null".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
