//! Monitor sources: the producers of the three info screens.
//!
//! Every source implements [`MonitorSource`].  The scheduler calls
//! `produce_next_screen` once per tick and stores the result at the source's
//! position in the screen registry, so the order sources are registered in
//! is the order the keyboard numbers them.
//!
//! | Index | Source            | Data trait       |
//! |-------|-------------------|------------------|
//! | 0     | [`PerfMonitor`]   | [`PerfProbe`]    |
//! | 1     | [`StockMonitor`]  | [`PriceFetcher`] |
//! | 2     | [`WeatherMonitor`]| [`WeatherFetcher`] |
//!
//! Sources own their fallbacks: a failed reading reuses the previous value
//! instead of failing the whole screen.

use async_trait::async_trait;
use hidscreen_core::{FormatError, Screen, ScreenKind};
use thiserror::Error;

pub mod perf;
pub mod stock;
pub mod weather;

pub use perf::{PerfMonitor, PerfProbe, ProbeError};
pub use stock::{PriceFetcher, StockMonitor};
pub use weather::{WeatherFetcher, WeatherMonitor, WeatherReport};

/// Error type for a source that could not produce any screen.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("screen formatting failed: {0}")]
    Format(#[from] FormatError),
}

/// Error type for the network fetchers behind the stock and weather sources.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(String),
    #[error("page did not contain {0}")]
    Missing(&'static str),
    #[error("could not parse {field}: {reason}")]
    Parse { field: &'static str, reason: String },
}

/// A producer of one screen.
#[async_trait]
pub trait MonitorSource: Send {
    /// Which screen this source renders.
    fn kind(&self) -> ScreenKind;

    /// Produces the screen for the current tick.
    async fn produce_next_screen(&mut self) -> Result<Screen, MonitorError>;
}
