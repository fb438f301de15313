//! Weather scraper for Yahoo weather pages.
//!
//! Reads three embedded values:
//!
//! - `"temperature":{"now":..,"high":..}`
//! - `"conditionDescription":"..."`
//! - `"precipitationProbability":NN,`

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{display_value, fetch_page, parse_fragment};
use crate::application::monitors::{FetchError, WeatherFetcher, WeatherReport};

pub const DEFAULT_WEATHER_URL: &str =
    "https://www.yahoo.com/news/weather/united-states/st-augustine/st-augustine-12771497";

/// [`WeatherFetcher`] for one fixed location page.
pub struct YahooWeatherScraper {
    client: reqwest::Client,
    url: String,
    temperature: Regex,
    condition: Regex,
    precipitation: Regex,
}

impl YahooWeatherScraper {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            client,
            url: url.into(),
            temperature: Regex::new(r#""temperature":(\{[^}]+\})"#)?,
            condition: Regex::new(r#""conditionDescription":"([^"]+)""#)?,
            precipitation: Regex::new(r#""precipitationProbability":([^,]+),"#)?,
        })
    }

    /// Extracts the weather values from a page body.
    pub fn parse_report(&self, body: &str) -> Result<WeatherReport, FetchError> {
        let temperature = self
            .temperature
            .captures(body)
            .ok_or(FetchError::Missing("temperature"))?;
        let temperature = parse_fragment("temperature", &temperature[1])?;
        let temp_now = display_value(&temperature["now"]).ok_or(FetchError::Missing("temperature.now"))?;
        let temp_high =
            display_value(&temperature["high"]).ok_or(FetchError::Missing("temperature.high"))?;

        let description = self
            .condition
            .captures(body)
            .ok_or(FetchError::Missing("conditionDescription"))?[1]
            .to_string();

        let rain = self
            .precipitation
            .captures(body)
            .ok_or(FetchError::Missing("precipitationProbability"))?[1]
            .trim()
            .to_string();

        Ok(WeatherReport {
            description,
            temp_now,
            temp_high,
            rain,
        })
    }
}

#[async_trait]
impl WeatherFetcher for YahooWeatherScraper {
    async fn fetch_weather(&self) -> Result<WeatherReport, FetchError> {
        let body = fetch_page(&self.client, &self.url).await?;
        let report = self.parse_report(&body)?;
        debug!(?report, "fetched weather");
        Ok(report)
    }
}
