//! Configuration module for gator.
//!
//! The configuration lives in a small JSON file in the user's home directory.
//! It records where the database is and which user is currently logged in,
//! and is rewritten whenever the current user changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{GatorError, Result};

/// File name of the configuration inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "GATOR_CONFIG";

/// Persisted configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Storage connection string (e.g. `sqlite://gator.db`).
    #[serde(default)]
    pub db_url: String,
    /// Name of the currently logged in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_name: Option<String>,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_log_level() -> &'static str {
    "warn"
}

impl Config {
    /// Create a configuration pointing at the given database.
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            current_user_name: None,
            log_level: None,
        }
    }

    /// Resolve the configuration file path.
    ///
    /// `GATOR_CONFIG` wins; otherwise the file sits in `$HOME`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| GatorError::Config("cannot locate home directory".to_string()))?;
        Ok(PathBuf::from(home).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GatorError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Load configuration from a JSON file, apply environment overrides and validate.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    pub fn parse(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| GatorError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GATOR_DB_URL`: Override the database connection string
    /// - `GATOR_LOG_LEVEL`: Override the log level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(db_url) = std::env::var("GATOR_DB_URL") {
            if !db_url.is_empty() {
                self.db_url = db_url;
            }
        }
        if let Ok(level) = std::env::var("GATOR_LOG_LEVEL") {
            if !level.is_empty() {
                self.log_level = Some(level);
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.db_url.trim().is_empty() {
            return Err(GatorError::Config(
                "db_url is not set. Set it in the config file or via GATOR_DB_URL.".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective log level.
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Write the configuration to disk, replacing the previous contents.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| GatorError::Config(format!("config encode error: {e}")))?;
        std::fs::write(path, json).map_err(|e| {
            GatorError::Config(format!("cannot write {}: {e}", path.display()))
        })
    }

    /// Record `name` as the current user and persist the change.
    pub fn set_user<P: AsRef<Path>>(&mut self, name: impl Into<String>, path: P) -> Result<()> {
        self.current_user_name = Some(name.into());
        self.save(path)
    }
}
