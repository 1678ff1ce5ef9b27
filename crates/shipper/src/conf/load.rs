//! Load: config loading from file and environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use super::model::ShipperConfig;

pub const CONFIG_FILE_VAR: &str = "SHIPPER_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "/etc/shipper/shipper.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ShipperConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::default()
        };

        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `SHIPPER_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SHIPPER_DIRECTORY") {
            self.directory = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SHIPPER_META_DIR") {
            self.meta_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("SHIPPER_REST_URL") {
            self.rest_url = url;
        }
        if let Some(label) = lookup("SHIPPER_TYPE") {
            self.record_type = label;
        }
        if let Some(value) = lookup("SHIPPER_LABEL_POLICY") {
            self.label_policy = parse_env("SHIPPER_LABEL_POLICY", &value)?;
        }
        if let Some(value) = lookup("SHIPPER_WATCH_MODE") {
            self.watch_mode = parse_env("SHIPPER_WATCH_MODE", &value)?;
        }
        if let Some(value) = lookup("SHIPPER_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_env("SHIPPER_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("SHIPPER_AUXILIARY_SERVICE") {
            self.with_auxiliary_service = parse_env("SHIPPER_AUXILIARY_SERVICE", &value)?;
        }
        if let Some(level) = lookup("SHIPPER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(value) = lookup("SHIPPER_LOG_FORMAT") {
            self.logging.format = parse_env("SHIPPER_LOG_FORMAT", &value)?;
        }
        Ok(())
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("directory must not be empty".to_string()));
        }
        if self.meta_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("meta_dir must not be empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".to_string()));
        }
        if self.with_auxiliary_service && self.rest_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "rest_url must not be empty when the auxiliary service is enabled".to_string(),
            ));
        }
        if let Some(key) = &self.envelope_key {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid("envelope_key must not be empty when set".to_string()));
            }
        }
        Ok(())
    }
}

fn parse_env<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnv {
        var,
        reason: format!("'{}': {}", value, e),
    })
}
