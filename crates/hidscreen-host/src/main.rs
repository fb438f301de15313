//! hidscreen host daemon: entry point.
//!
//! Streams three info screens (system performance, stock quotes, weather)
//! to a QMK split keyboard's OLED over raw HID.  The keyboard picks which
//! screen it shows; the host keeps all three up to date and sends the
//! selected one whenever it changes.
//!
//! # Usage
//!
//! ```text
//! hidscreen [OPTIONS]
//!
//! Options:
//!   --config <PATH>        TOML settings file [env: HIDSCREEN_CONFIG]
//!   --tick-ms <MS>         Milliseconds between refreshes [env: HIDSCREEN_TICK_MS]
//!   --symbols <A,B,..>     Up to four stock symbols [env: HIDSCREEN_SYMBOLS]
//!   --weather-url <URL>    Weather page to scrape [env: HIDSCREEN_WEATHER_URL]
//! ```
//!
//! Flags override the file; anything unset falls back to the built-in
//! defaults (see `infrastructure::config`).
//!
//! # Architecture overview
//!
//! ```text
//! Scheduler (one tick per interval)
//!   ├── PerfMonitor    ← SystemPerfProbe (sysinfo, battery, mixer)
//!   ├── StockMonitor   ← YahooQuoteScraper (reqwest)
//!   ├── WeatherMonitor ← YahooWeatherScraper (reqwest)
//!   └── DeviceLink     ← HidApiBackend (hidapi, `native-hid` feature)
//!           ↕ raw HID reports
//!       keyboard firmware
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hidscreen_core::LINE_COUNT;
use hidscreen_host::application::{
    device_link::{DeviceLink, HidBackend, PacingPolicy},
    monitors::{MonitorSource, PerfMonitor, StockMonitor, WeatherMonitor},
    scheduler::Scheduler,
};
use hidscreen_host::infrastructure::{
    config::{load_config, HostConfig},
    system::SystemPerfProbe,
    web::{http_client, YahooQuoteScraper, YahooWeatherScraper},
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Keyboard OLED info-screen host.
#[derive(Debug, Parser)]
#[command(
    name = "hidscreen",
    about = "Streams performance, stock and weather screens to a keyboard OLED over raw HID",
    version
)]
struct Cli {
    /// TOML settings file.  A missing file means "all defaults".
    #[arg(long, env = "HIDSCREEN_CONFIG")]
    config: Option<PathBuf>,

    /// Milliseconds between scheduler ticks.
    #[arg(long, env = "HIDSCREEN_TICK_MS")]
    tick_ms: Option<u64>,

    /// Comma-separated stock symbols, one per display line.
    #[arg(long, env = "HIDSCREEN_SYMBOLS", value_delimiter = ',')]
    symbols: Vec<String>,

    /// Weather page URL.
    #[arg(long, env = "HIDSCREEN_WEATHER_URL")]
    weather_url: Option<String>,
}

impl Cli {
    /// Loads the settings file and applies the flags on top of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, the tick is
    /// zero, or more symbols are given than the display has lines.
    fn into_host_config(self) -> anyhow::Result<HostConfig> {
        let mut config = load_config(self.config.as_deref()).with_context(|| {
            format!(
                "failed to load settings from {}",
                self.config
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            )
        })?;

        if let Some(tick_ms) = self.tick_ms {
            config.schedule.tick_interval_ms = tick_ms;
        }
        if !self.symbols.is_empty() {
            config.stocks.symbols = self.symbols;
        }
        if let Some(url) = self.weather_url {
            config.weather.url = url;
        }

        if config.schedule.tick_interval_ms == 0 {
            bail!("tick interval must be at least 1 ms");
        }
        if config.stocks.symbols.len() > LINE_COUNT {
            bail!(
                "{} stock symbols given but the display fits {LINE_COUNT}",
                config.stocks.symbols.len()
            );
        }
        Ok(config)
    }
}

/// Explains why the stock screen will never be sent, if it won't.
///
/// A complete screen needs one symbol per display line; with fewer the
/// screen stays short and is always skipped.
fn short_stock_screen_warning(symbols: &[String]) -> Option<String> {
    (symbols.len() < LINE_COUNT).then(|| {
        format!(
            "{} stock symbols configured but the display has {LINE_COUNT} lines; \
             the stock screen will never be complete and is never sent",
            symbols.len()
        )
    })
}

// ── Wiring ────────────────────────────────────────────────────────────────────

#[cfg(feature = "native-hid")]
fn build_backend() -> anyhow::Result<Arc<dyn HidBackend>> {
    use hidscreen_host::infrastructure::hid::native::HidApiBackend;
    let backend = HidApiBackend::new().context("failed to initialise hidapi")?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "native-hid"))]
fn build_backend() -> anyhow::Result<Arc<dyn HidBackend>> {
    bail!("this build has no HID transport; rebuild with the default `native-hid` feature")
}

/// Builds the three sources in keyboard order: performance, stocks, weather.
fn build_sources(config: &HostConfig) -> anyhow::Result<Vec<Box<dyn MonitorSource>>> {
    let client = http_client(config.http_timeout(), &config.network.user_agent)
        .context("failed to build HTTP client")?;

    let probe = SystemPerfProbe::new().context("failed to set up system probe")?;
    let quotes = YahooQuoteScraper::new(client.clone(), config.stocks.quote_url.clone())
        .context("failed to set up quote scraper")?;
    let weather = YahooWeatherScraper::new(client, config.weather.url.clone())
        .context("failed to set up weather scraper")?;

    Ok(vec![
        Box::new(PerfMonitor::new(probe)),
        Box::new(StockMonitor::new(
            quotes,
            config.stocks.symbols.clone(),
            config.schedule.stock_refresh_every,
        )),
        Box::new(WeatherMonitor::new(weather)),
    ])
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_host_config()?;
    info!(
        product = %config.keyboard.product_name,
        symbols = ?config.stocks.symbols,
        tick_ms = config.schedule.tick_interval_ms,
        "hidscreen host starting"
    );
    if let Some(message) = short_stock_screen_warning(&config.stocks.symbols) {
        warn!("{message}");
    }

    let backend = build_backend()?;
    let sources = build_sources(&config)?;
    let link = Arc::new(DeviceLink::new(
        backend,
        config.device_filter(),
        PacingPolicy::for_current_platform(),
        sources.len(),
    ));
    let scheduler = Scheduler::new(sources, link, config.tick_interval())?;

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::SeqCst);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    scheduler.run(running).await;

    info!("hidscreen host stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cli_defaults_leave_config_untouched() {
        // Arrange
        let cli = Cli::parse_from(["hidscreen"]);

        // Act
        let config = cli.into_host_config().unwrap();

        // Assert
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_cli_tick_override() {
        let cli = Cli::parse_from(["hidscreen", "--tick-ms", "500"]);
        let config = cli.into_host_config().unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_cli_symbols_are_comma_separated() {
        let cli = Cli::parse_from(["hidscreen", "--symbols", "AAPL,NVDA"]);
        assert_eq!(cli.symbols, vec!["AAPL", "NVDA"]);

        let config = cli.into_host_config().unwrap();
        assert_eq!(config.stocks.symbols, vec!["AAPL", "NVDA"]);
    }

    #[test]
    fn test_cli_weather_url_override() {
        let cli = Cli::parse_from(["hidscreen", "--weather-url", "https://example.com/w"]);
        let config = cli.into_host_config().unwrap();
        assert_eq!(config.weather.url, "https://example.com/w");
    }

    #[test]
    fn test_cli_rejects_more_symbols_than_lines() {
        let cli = Cli::parse_from(["hidscreen", "--symbols", "A,B,C,D,E"]);
        assert!(cli.into_host_config().is_err());
    }

    #[test]
    fn test_cli_rejects_zero_tick() {
        let cli = Cli::parse_from(["hidscreen", "--tick-ms", "0"]);
        assert!(cli.into_host_config().is_err());
    }

    #[test]
    fn test_short_symbol_list_is_warned_about() {
        let cli = Cli::parse_from(["hidscreen", "--symbols", "AAPL,NVDA"]);
        let config = cli.into_host_config().unwrap();

        let warning = short_stock_screen_warning(&config.stocks.symbols).expect("warning");
        assert!(warning.starts_with("2 stock symbols"));
        assert!(short_stock_screen_warning(&[]).is_some());
    }

    #[test]
    fn test_four_symbols_need_no_warning() {
        let config = HostConfig::default();
        assert_eq!(config.stocks.symbols.len(), LINE_COUNT);
        assert_eq!(short_stock_screen_warning(&config.stocks.symbols), None);
    }

    #[test]
    fn test_default_build_has_hid_transport() {
        assert!(cfg!(feature = "native-hid"));
    }

    #[test]
    fn test_build_sources_in_keyboard_order() {
        use hidscreen_core::ScreenKind;

        let sources = build_sources(&HostConfig::default()).unwrap();
        let kinds: Vec<ScreenKind> = sources.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, ScreenKind::ALL.to_vec());
    }
}
