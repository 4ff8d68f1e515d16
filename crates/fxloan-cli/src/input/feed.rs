//! HTTP fetch of the published exchange-rate feed.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Public feed of scraped CIMB / Wise / PandaRemit MYR rates.
pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/likweitan/CIMB-exchange-rates/main/exchange_rates.json";

const FEED_URL_ENV: &str = "FXLOAN_FEED_URL";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `--url` wins, then `FXLOAN_FEED_URL` (a `.env` file is honoured), then the
/// public feed.
pub fn resolve_feed_url(flag: Option<&str>) -> String {
    if let Some(url) = flag {
        return url.to_string();
    }
    dotenvy::dotenv().ok();
    std::env::var(FEED_URL_ENV).unwrap_or_else(|_| DEFAULT_FEED_URL.to_string())
}

/// Download the feed and return its JSON body untouched.
pub fn fetch_feed(url: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

    info!(%url, "fetching rate feed");
    let resp = client
        .get(url)
        .send()
        .map_err(|e| format!("Feed request failed: {e}"))?;

    if !resp.status().is_success() {
        return Err(format!("Feed request failed with status {}", resp.status()).into());
    }

    let body: Value = resp
        .json()
        .map_err(|e| format!("Feed response is not valid JSON: {e}"))?;
    debug!(
        records = body.as_array().map(Vec::len).unwrap_or(0),
        "rate feed downloaded"
    );
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_overrides_environment() {
        let url = resolve_feed_url(Some("http://localhost:9000/rates.json"));
        assert_eq!(url, "http://localhost:9000/rates.json");
    }
}
