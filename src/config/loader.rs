use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::types::{SchedulerConfig, SchedulerKind, StoreConfig};
use crate::sync::{ImmediateScheduler, Scheduler, ThreadScheduler};

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Failed to start scheduler thread '{name}': {source}")]
    SchedulerError {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreConfig {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/lenstore/config.toml` on Unix,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("lenstore").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `StoreConfig::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(StoreConfig::default());
        }
        Self::load_from(&path)
    }

    /// Reads, parses and validates the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: StoreConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Parses and validates an in-memory TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Thread names are only given to thread schedulers, and are not blank
    /// - The log level is not empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (role, scheduler) in [("update", &self.update), ("notification", &self.notification)] {
            match (&scheduler.kind, &scheduler.thread_name) {
                (SchedulerKind::Immediate, Some(_)) => {
                    return Err(ConfigError::ValidationError {
                        message: format!("[{role}] thread_name requires kind = \"thread\""),
                    });
                }
                (SchedulerKind::Thread, Some(name)) if name.trim().is_empty() => {
                    return Err(ConfigError::ValidationError {
                        message: format!("[{role}] thread_name must not be empty"),
                    });
                }
                _ => {}
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "logging.level must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

impl SchedulerConfig {
    /// Creates the scheduler this entry describes. `role` names the default
    /// worker thread.
    pub fn build(&self, role: &str) -> Result<Arc<dyn Scheduler>, ConfigError> {
        match self.kind {
            SchedulerKind::Immediate => Ok(Arc::new(ImmediateScheduler)),
            SchedulerKind::Thread => {
                let name = self
                    .thread_name
                    .clone()
                    .unwrap_or_else(|| format!("lenstore-{role}"));
                let scheduler = ThreadScheduler::new(name.clone())
                    .map_err(|source| ConfigError::SchedulerError { name, source })?;
                Ok(Arc::new(scheduler))
            }
        }
    }
}
