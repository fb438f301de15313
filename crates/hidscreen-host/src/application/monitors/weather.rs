//! Weather screen: condition, current temperature, high, chance of rain.
//!
//! The condition text often exceeds the 9-character field, so it scrolls one
//! character per tick while it stays the same (see
//! [`DescriptionScroller`]).

use async_trait::async_trait;
use hidscreen_core::{format_weather_screen, DescriptionScroller, Screen, ScreenKind, WeatherFields};
use tracing::warn;

use super::{FetchError, MonitorError, MonitorSource};

/// Raw values scraped from a weather page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherReport {
    pub description: String,
    pub temp_now: String,
    pub temp_high: String,
    /// Chance of precipitation, without the `%`.
    pub rain: String,
}

/// Fetches the current weather for the configured location.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    async fn fetch_weather(&self) -> Result<WeatherReport, FetchError>;
}

/// Renders the weather screen from a [`WeatherFetcher`].
///
/// A failed fetch re-sends the previous screen unchanged.  Before the first
/// success that is an empty (incomplete) screen, which the device link will
/// not send.
pub struct WeatherMonitor<F> {
    fetcher: F,
    scroller: DescriptionScroller,
    last: Screen,
}

impl<F: WeatherFetcher> WeatherMonitor<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            scroller: DescriptionScroller::new(),
            last: Screen::empty(),
        }
    }
}

#[async_trait]
impl<F: WeatherFetcher> MonitorSource for WeatherMonitor<F> {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Weather
    }

    async fn produce_next_screen(&mut self) -> Result<Screen, MonitorError> {
        match self.fetcher.fetch_weather().await {
            Ok(report) => {
                let fields = WeatherFields {
                    description: self.scroller.window(&report.description),
                    temp_now: report.temp_now,
                    temp_high: report.temp_high,
                    rain: report.rain,
                };
                self.last = format_weather_screen(&fields);
            }
            Err(e) => warn!("weather fetch failed, showing previous screen: {e}"),
        }
        Ok(self.last.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(description: &str) -> WeatherReport {
        WeatherReport {
            description: description.to_string(),
            temp_now: "72".to_string(),
            temp_high: "81".to_string(),
            rain: "20".to_string(),
        }
    }

    fn screen_for(description_window: &str) -> Screen {
        format_weather_screen(&WeatherFields {
            description: description_window.to_string(),
            temp_now: "72".to_string(),
            temp_high: "81".to_string(),
            rain: "20".to_string(),
        })
    }

    #[tokio::test]
    async fn test_long_description_scrolls_each_call() {
        let mut fetcher = MockWeatherFetcher::new();
        fetcher
            .expect_fetch_weather()
            .returning(|| Ok(report("PartlyCloudyRain")));
        let mut monitor = WeatherMonitor::new(fetcher);

        let first = monitor.produce_next_screen().await.unwrap();
        let second = monitor.produce_next_screen().await.unwrap();

        assert_eq!(first, screen_for("PartlyClo"));
        assert_eq!(second, screen_for("artlyClou"));
        assert!(first.is_complete());
        assert_eq!(monitor.kind(), ScreenKind::Weather);
    }

    #[tokio::test]
    async fn test_failed_fetch_returns_previous_screen() {
        // Arrange
        let mut fetcher = MockWeatherFetcher::new();
        fetcher
            .expect_fetch_weather()
            .times(1)
            .returning(|| Ok(report("Sunny")));
        fetcher
            .expect_fetch_weather()
            .returning(|| Err(FetchError::Http("timed out".to_string())));
        let mut monitor = WeatherMonitor::new(fetcher);

        // Act
        let first = monitor.produce_next_screen().await.unwrap();
        let second = monitor.produce_next_screen().await.unwrap();

        // Assert
        assert_eq!(first, screen_for("Sunny"));
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_failure_before_first_success_yields_incomplete_screen() {
        let mut fetcher = MockWeatherFetcher::new();
        fetcher
            .expect_fetch_weather()
            .returning(|| Err(FetchError::Missing("temperature")));
        let mut monitor = WeatherMonitor::new(fetcher);

        let screen = monitor.produce_next_screen().await.unwrap();

        assert!(!screen.is_complete());
    }
}
