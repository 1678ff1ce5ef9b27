//! Model: ShipperConfig and related structs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::normalize::LabelPolicy;

pub const DEFAULT_REST_URL: &str = "http://localhost:8080/metadata/JSON";
pub const DEFAULT_RECORD_TYPE: &str = "audit-log";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipperConfig {
    /// Directory watched for new and modified audit-log files
    pub directory: PathBuf,
    /// Metadata directory, created at start and served by the metadata service
    pub meta_dir: PathBuf,
    pub rest_url: String,
    /// Label written to each record's `type` key; empty means none
    #[serde(rename = "type")]
    pub record_type: String,
    pub label_policy: LabelPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope_key: Option<String>,
    pub with_auxiliary_service: bool,
    pub watch_mode: WatchMode,
    pub poll_interval_ms: u64,
    pub metadata_ready_timeout_ms: u64,
    pub logging: LoggingConfig,
}

/// Event loop strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    /// Non-blocking poll, sleeping one idle tick when nothing is pending.
    /// Observes `stop()` within a tick.
    #[default]
    Polling,
    /// Block until events arrive. Only a closed registration unblocks it.
    Blocking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./data"),
            meta_dir: PathBuf::from("./meta"),
            rest_url: DEFAULT_REST_URL.to_string(),
            record_type: DEFAULT_RECORD_TYPE.to_string(),
            label_policy: LabelPolicy::default(),
            envelope_key: None,
            with_auxiliary_service: true,
            watch_mode: WatchMode::default(),
            poll_interval_ms: 100,
            metadata_ready_timeout_ms: 2000,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl ShipperConfig {
    /// The configured label, or `None` when `type` is blank.
    pub fn record_label(&self) -> Option<String> {
        let label = self.record_type.trim();
        if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        }
    }
}

impl WatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchMode::Polling => "polling",
            WatchMode::Blocking => "blocking",
        }
    }
}

impl fmt::Display for WatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(WatchMode::Polling),
            "blocking" | "block" => Ok(WatchMode::Blocking),
            other => Err(format!("unknown watch mode '{}' (expected polling or blocking)", other)),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected pretty or json)", other)),
        }
    }
}
