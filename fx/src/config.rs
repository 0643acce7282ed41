//! Converter configuration.

use chrono::Duration;
use ratebridge_common::constants;

use crate::error::{FxError, FxResult};

/// Default endpoint of the multi-currency rate API.
pub const DEFAULT_API_URL: &str = "https://api.exchangerate-api.com/v4/latest";

/// Default URL of the central bank daily feed.
pub const DEFAULT_DOMESTIC_FEED_URL: &str = "https://www.cbr-xml-daily.ru/daily_json.js";

/// Environment variable overriding [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "RATEBRIDGE_API_URL";

/// Main converter configuration.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Base endpoint; requests go to `{api_url}/{BASE}`.
    pub api_url: String,
    /// National-bank feed URL.
    pub domestic_feed_url: String,
    /// Per-request timeout for both sources.
    pub request_timeout: Duration,
    /// Max age of a cached table before it is re-fetched.
    pub freshness_window: Duration,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            domestic_feed_url: DEFAULT_DOMESTIC_FEED_URL.to_string(),
            request_timeout: constants::request_timeout(),
            freshness_window: constants::freshness_window(),
        }
    }
}

impl ConverterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url;
            }
        }

        config
    }

    /// Use a different rate API endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Use a different freshness window.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(FxError::Configuration("API URL cannot be empty".to_string()));
        }

        if self.domestic_feed_url.trim().is_empty() {
            return Err(FxError::Configuration(
                "Domestic feed URL cannot be empty".to_string(),
            ));
        }

        if self.request_timeout <= Duration::zero() {
            return Err(FxError::Configuration(
                "Request timeout must be positive".to_string(),
            ));
        }

        if self.freshness_window <= Duration::zero() {
            return Err(FxError::Configuration(
                "Freshness window must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
