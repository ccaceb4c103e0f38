use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;

/// Top-level configuration for sleepnumberd, loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target level overrides
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_api_listen")]
    pub listen: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: default_api_listen(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegrationsConfig {
    pub sleepiq: Option<SleepIqConfig>,
}

/// Configuration for the SleepIQ integration.
#[derive(Debug, Clone, Deserialize)]
pub struct SleepIqConfig {
    /// Enable the SleepIQ integration (default: true when section is present)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between status polls against the device service
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Beds served by the simulated device client
    #[serde(default)]
    pub beds: Vec<BedConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BedConfig {
    pub id: String,
    pub name: String,
    pub mac_addr: String,
    pub model: String,

    #[serde(default)]
    pub sleepers: Vec<SleeperConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SleeperConfig {
    /// Side of the bed: "left" or "right"
    pub side: String,
    pub name: String,

    #[serde(default)]
    pub in_bed: bool,

    #[serde(default = "default_sleep_number")]
    pub sleep_number: u8,
}

fn default_true() -> bool {
    true
}

fn default_api_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8565
}

fn default_poll_interval() -> u64 {
    60
}

fn default_sleep_number() -> u8 {
    50
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}
