//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Worker pool and probe behavior
    #[serde(default)]
    pub checker: CheckerConfig,

    /// Snapshot file location
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.checker.workers == 0 {
            return Err(AppError::validation("checker.workers must be > 0"));
        }
        if self.checker.queue_capacity == 0 {
            return Err(AppError::validation("checker.queue_capacity must be > 0"));
        }
        if self.checker.timeout_secs == 0 {
            return Err(AppError::validation("checker.timeout_secs must be > 0"));
        }
        if self.checker.user_agent.trim().is_empty() {
            return Err(AppError::validation("checker.user_agent is empty"));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(AppError::validation("storage.path is empty"));
        }
        if self.server.host.trim().is_empty() {
            return Err(AppError::validation("server.host is empty"));
        }
        Ok(())
    }
}

/// HTTP API listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl ServerConfig {
    /// Address the API listener binds to, resolved at bind time.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

/// Worker pool and probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Number of concurrent workers
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Capacity of the bounded task queue
    #[serde(default = "defaults::queue_capacity")]
    pub queue_capacity: usize,

    /// Per-probe timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Interval of the pending-link sweep in seconds, 0 disables it
    #[serde(default = "defaults::sweep_interval")]
    pub sweep_interval_secs: u64,

    /// User-Agent header for probes
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl CheckerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Sweep interval, `None` when the sweep is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            workers: defaults::workers(),
            queue_capacity: defaults::queue_capacity(),
            timeout_secs: defaults::timeout(),
            sweep_interval_secs: defaults::sweep_interval(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON snapshot file
    #[serde(default = "defaults::storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: defaults::storage_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Server defaults
    pub fn host() -> String {
        "0.0.0.0".into()
    }
    pub fn port() -> u16 {
        8080
    }

    // Checker defaults
    pub fn workers() -> usize {
        5
    }
    pub fn queue_capacity() -> usize {
        100
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn sweep_interval() -> u64 {
        5
    }
    pub fn user_agent() -> String {
        concat!("linkcheck/", env!("CARGO_PKG_VERSION")).into()
    }

    pub fn storage_path() -> PathBuf {
        PathBuf::from("storage.json")
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.checker.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_queue_capacity() {
        let mut config = Config::default();
        config.checker.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_host() {
        let mut config = Config::default();
        config.server.host = " ".to_string();
        assert!(config.validate().is_err());
        assert_eq!(Config::default().server.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn sample_config_parses() {
        let config: Config = toml::from_str(include_str!("../../linkcheck.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.checker.queue_capacity, 100);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [checker]
            workers = 2
            sweep_interval_secs = 0

            [storage]
            path = "data/links.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.checker.workers, 2);
        assert_eq!(config.checker.queue_capacity, 100);
        assert_eq!(config.checker.timeout_secs, 10);
        assert!(config.checker.sweep_interval().is_none());
        assert_eq!(config.storage.path, PathBuf::from("data/links.json"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.checker.workers, 5);
        assert_eq!(config.checker.sweep_interval(), Some(Duration::from_secs(5)));
    }
}
