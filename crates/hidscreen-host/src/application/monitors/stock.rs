//! Stock screen: one `SYMBOL: $price` line per configured ticker.
//!
//! Quotes are fetched on the first call and then on every
//! `refresh_every`-th call after it; in between the cached prices are
//! re-rendered.  With a one-second tick and the default of 10, that keeps
//! the quote site at one request per symbol per ten seconds.

use async_trait::async_trait;
use futures_util::future::join_all;
use hidscreen_core::{format_stock_screen, Screen, ScreenKind};
use tracing::{debug, warn};

use super::{FetchError, MonitorError, MonitorSource};

/// Price shown before a symbol's first successful fetch.
const UNKNOWN_PRICE: &str = "0";

/// Fetches the current price of one ticker symbol.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch_price(&self, symbol: &str) -> Result<f64, FetchError>;
}

struct Quote {
    symbol: String,
    price: String,
}

/// Renders the stock screen from a [`PriceFetcher`].
pub struct StockMonitor<F> {
    fetcher: F,
    quotes: Vec<Quote>,
    refresh_every: u64,
    calls: u64,
}

impl<F: PriceFetcher> StockMonitor<F> {
    /// `refresh_every` is clamped to at least 1 (refresh on every call).
    pub fn new<I, S>(fetcher: F, symbols: I, refresh_every: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fetcher,
            quotes: symbols
                .into_iter()
                .map(|symbol| Quote {
                    symbol: symbol.into(),
                    price: UNKNOWN_PRICE.to_string(),
                })
                .collect(),
            refresh_every: refresh_every.max(1),
            calls: 0,
        }
    }

    async fn refresh(&mut self) {
        let fetcher = &self.fetcher;
        let results = join_all(self.quotes.iter().map(|q| fetcher.fetch_price(&q.symbol))).await;

        for (quote, result) in self.quotes.iter_mut().zip(results) {
            match result {
                Ok(price) => quote.price = format!("{price:.2}"),
                Err(e) => warn!(symbol = %quote.symbol, "quote fetch failed: {e}"),
            }
        }
        debug!(symbols = self.quotes.len(), "stock quotes refreshed");
    }
}

#[async_trait]
impl<F: PriceFetcher> MonitorSource for StockMonitor<F> {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Stock
    }

    async fn produce_next_screen(&mut self) -> Result<Screen, MonitorError> {
        if self.calls % self.refresh_every == 0 {
            self.refresh().await;
        }
        self.calls += 1;

        let rows: Vec<(&str, &str)> = self
            .quotes
            .iter()
            .map(|q| (q.symbol.as_str(), q.price.as_str()))
            .collect();
        Ok(format_stock_screen(&rows))
    }
}
