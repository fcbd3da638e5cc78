//! Database Configuration
//!
//! A [`Config`] decides how the keyspace is laid out and whether expired keys
//! are reclaimed in the background. It can be built in code or read from the
//! environment:
//!
//! | Variable                    | Meaning                              | Default |
//! |-----------------------------|--------------------------------------|---------|
//! | `EMBERKV_SHARDS`            | Number of keyspace shards            | 64      |
//! | `EMBERKV_ACTIVE_EXPIRY`     | Run the background sweeper           | true    |
//! | `EMBERKV_SWEEP_INTERVAL_MS` | Sweeper's starting interval          | 100     |

use crate::storage::{ExpiryConfig, DEFAULT_SHARDS};
use anyhow::Context;
use std::time::Duration;
use thiserror::Error;

/// Largest accepted shard count.
pub const MAX_SHARDS: usize = 1024;

/// Errors from building or validating a [`Config`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("shard count must be a power of two between 1 and {max}, got {0}", max = MAX_SHARDS)]
    InvalidShardCount(usize),

    #[error("sweep interval must be between {min:?} and {max:?}, got {got:?}")]
    InvalidSweepInterval {
        got: Duration,
        min: Duration,
        max: Duration,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Configuration for a [`Database`](crate::Database).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Number of keyspace shards (power of two)
    pub num_shards: usize,

    /// Whether a background task purges expired keys
    pub active_expiry: bool,

    /// Cadence of the background sweeper
    pub expiry: ExpiryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_shards: DEFAULT_SHARDS,
            active_expiry: true,
            expiry: ExpiryConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_shards(mut self, num_shards: usize) -> Self {
        self.num_shards = num_shards;
        self
    }

    pub fn active_expiry(mut self, enabled: bool) -> Self {
        self.active_expiry = enabled;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.expiry.base_interval = interval;
        self
    }

    pub fn expiry(mut self, expiry: ExpiryConfig) -> Self {
        self.expiry = expiry;
        self
    }

    /// Checks that the configuration describes a database that can be opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.num_shards;
        if n == 0 || n > MAX_SHARDS || !n.is_power_of_two() {
            return Err(ConfigError::InvalidShardCount(n));
        }

        let ExpiryConfig {
            base_interval,
            min_interval,
            max_interval,
            ..
        } = self.expiry;
        if base_interval < min_interval || base_interval > max_interval {
            return Err(ConfigError::InvalidSweepInterval {
                got: base_interval,
                min: min_interval,
                max: max_interval,
            });
        }

        Ok(())
    }

    /// Reads the configuration from `EMBERKV_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
            .context("failed to load configuration from the environment")
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("EMBERKV_SHARDS") {
            config.num_shards = parse_var("EMBERKV_SHARDS", &value, |s| s.parse().ok())?;
        }

        if let Some(value) = lookup("EMBERKV_ACTIVE_EXPIRY") {
            config.active_expiry = parse_var("EMBERKV_ACTIVE_EXPIRY", &value, parse_bool)?;
        }

        if let Some(value) = lookup("EMBERKV_SWEEP_INTERVAL_MS") {
            let ms: u64 = parse_var("EMBERKV_SWEEP_INTERVAL_MS", &value, |s| s.parse().ok())?;
            config.expiry.base_interval = Duration::from_millis(ms);
        }

        config
            .validate()
            .with_context(|| format!("invalid configuration: {config:?}"))?;
        Ok(config)
    }
}

fn parse_var<T>(
    var: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    parse(value.trim()).ok_or_else(|| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
