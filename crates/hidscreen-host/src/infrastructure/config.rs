//! TOML settings for the host.
//!
//! Every field has a default, so the host runs without any file at all and
//! a file only needs the keys it changes:
//!
//! ```toml
//! [keyboard]
//! product_name = "Lily58"
//! usage_id = 0x61
//! usage_page = 0xFF60
//!
//! [schedule]
//! tick_interval_ms = 1000
//! stock_refresh_every = 10
//!
//! [stocks]
//! symbols = ["MSFT", "TSLA", "GOOG", "FB"]
//!
//! [weather]
//! url = "https://www.yahoo.com/news/weather/united-states/st-augustine/st-augustine-12771497"
//!
//! [network]
//! timeout_secs = 10
//! ```
//!
//! Command-line flags in `main.rs` are applied on top of the loaded file.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::device_link::DeviceFilter;
use crate::infrastructure::web::{quote::DEFAULT_QUOTE_URL, weather::DEFAULT_WEATHER_URL};

/// Error type for loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error other than "not found".
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub stocks: StocksConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Which HID interface is the keyboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyboardConfig {
    #[serde(default = "default_product_name")]
    pub product_name: String,
    #[serde(default = "default_usage_id")]
    pub usage_id: u16,
    #[serde(default = "default_usage_page")]
    pub usage_page: u16,
}

/// Tick timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    /// Milliseconds between scheduler ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Quotes are re-fetched on every Nth tick.
    #[serde(default = "default_stock_refresh_every")]
    pub stock_refresh_every: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StocksConfig {
    /// Up to four ticker symbols, one per display line.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Quote page URL with a `{symbol}` placeholder.
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub url: String,
}

/// HTTP client settings for the scrapers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_product_name() -> String {
    "Lily58".to_string()
}
fn default_usage_id() -> u16 {
    0x61
}
fn default_usage_page() -> u16 {
    0xFF60
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_stock_refresh_every() -> u64 {
    10
}
fn default_symbols() -> Vec<String> {
    ["MSFT", "TSLA", "GOOG", "FB"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_quote_url() -> String {
    DEFAULT_QUOTE_URL.to_string()
}
fn default_weather_url() -> String {
    DEFAULT_WEATHER_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    concat!("hidscreen/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            product_name: default_product_name(),
            usage_id: default_usage_id(),
            usage_page: default_usage_page(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            stock_refresh_every: default_stock_refresh_every(),
        }
    }
}

impl Default for StocksConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            quote_url: default_quote_url(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            url: default_weather_url(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HostConfig {
    pub fn device_filter(&self) -> DeviceFilter {
        DeviceFilter {
            product_name: self.keyboard.product_name.clone(),
            usage_id: self.keyboard.usage_id,
            usage_page: self.keyboard.usage_page,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.schedule.tick_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads settings from `path`, or returns the defaults when no path is given
/// or the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<HostConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(HostConfig::default());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
