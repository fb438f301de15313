//! Page scrapers for stock quotes and weather.
//!
//! Both sites embed their data as JSON fragments inside the HTML.  Each
//! scraper downloads the page with a shared `reqwest` client and pulls the
//! fragments out with a regex, then reads the values with `serde_json`.
//! The parsing halves are plain functions over the page body so they can
//! be tested against saved snippets.

use std::time::Duration;

use serde_json::Value;

use crate::application::monitors::FetchError;

pub mod quote;
pub mod weather;

pub use quote::YahooQuoteScraper;
pub use weather::YahooWeatherScraper;

/// Builds the HTTP client shared by the scrapers.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| FetchError::Http(e.to_string()))
}

/// Downloads `url` and returns the body, treating non-2xx as an error.
pub(crate) async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| FetchError::Http(e.to_string()))?;
    response
        .text()
        .await
        .map_err(|e| FetchError::Http(e.to_string()))
}

/// Parses an embedded JSON object such as `{"raw":412.3,"fmt":"412.30"}`.
pub(crate) fn parse_fragment(field: &'static str, text: &str) -> Result<Value, FetchError> {
    serde_json::from_str(text).map_err(|e| FetchError::Parse {
        field,
        reason: e.to_string(),
    })
}

/// Renders a JSON scalar the way it should appear on screen: integers
/// without a decimal point, other numbers rounded, strings verbatim.
pub(crate) fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(|f| format!("{f:.0}")),
        },
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
