//! Stock price scraper for Yahoo Finance quote pages.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{fetch_page, parse_fragment};
use crate::application::monitors::{FetchError, PriceFetcher};

/// Quote page URL; `{symbol}` is replaced with the ticker.
pub const DEFAULT_QUOTE_URL: &str = "https://finance.yahoo.com/quote/{symbol}/";

/// [`PriceFetcher`] that reads `"currentPrice":{"raw":..}` from the quote page.
pub struct YahooQuoteScraper {
    client: reqwest::Client,
    url_template: String,
    current_price: Regex,
}

impl YahooQuoteScraper {
    pub fn new(client: reqwest::Client, url_template: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            client,
            url_template: url_template.into(),
            current_price: Regex::new(r#""currentPrice":(\{[^}]+\})"#)?,
        })
    }

    fn url_for(&self, symbol: &str) -> String {
        self.url_template.replace("{symbol}", symbol)
    }

    /// Extracts the raw current price from a quote page body.
    pub fn parse_price(&self, body: &str) -> Result<f64, FetchError> {
        let caps = self
            .current_price
            .captures(body)
            .ok_or(FetchError::Missing("currentPrice"))?;
        let fragment = parse_fragment("currentPrice", &caps[1])?;
        fragment["raw"].as_f64().ok_or(FetchError::Parse {
            field: "currentPrice",
            reason: "no numeric raw value".to_string(),
        })
    }
}

#[async_trait]
impl PriceFetcher for YahooQuoteScraper {
    async fn fetch_price(&self, symbol: &str) -> Result<f64, FetchError> {
        let url = self.url_for(symbol);
        let body = fetch_page(&self.client, &url).await?;
        let price = self.parse_price(&body)?;
        debug!(symbol, price, "fetched quote");
        Ok(price)
    }
}
