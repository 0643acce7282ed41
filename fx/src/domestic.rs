//! National-bank feed for authoritative domestic-currency rates.
//!
//! The feed prices a handful of foreign currencies in the domestic currency.
//! Only the tracked currencies (USD, EUR) are read from it. It is a
//! best-effort source: callers see `None` when it cannot be used and keep
//! the primary provider's value.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use ratebridge_common::Currency;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};
use crate::http;

/// Per-unit domestic prices for the tracked foreign currencies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomesticRatePatch {
    rates: BTreeMap<Currency, Decimal>,
}

impl DomesticRatePatch {
    /// Build a patch, keeping only tracked currencies.
    pub fn from_rates(rates: impl IntoIterator<Item = (Currency, Decimal)>) -> Self {
        Self {
            rates: rates.into_iter().filter(|(c, _)| c.is_tracked()).collect(),
        }
    }

    /// Domestic units per one unit of `currency`.
    pub fn rate_for(&self, currency: &Currency) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }
}

/// Trait for the domestic authority feed.
#[async_trait]
pub trait DomesticRateFeed: Send + Sync {
    /// Get the feed name.
    fn name(&self) -> &str;

    /// Fetch the current patch, or `None` when the feed is unavailable.
    async fn fetch_patch(&self) -> Option<DomesticRatePatch>;
}

const FEED_NAME: &str = "cbr-daily";

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Valute")]
    valute: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Valuation {
    #[serde(rename = "Value")]
    value: Decimal,
    #[serde(rename = "Nominal")]
    nominal: Decimal,
}

/// Parse a `{"Valute": {CODE: {"Value": n, "Nominal": n}}}` body.
///
/// The feed quotes per lot of `Nominal` units, so each tracked rate is
/// `Value / Nominal`. A tracked entry with a zero `Nominal` fails the whole
/// response. Entries for untracked codes are not inspected.
pub fn parse_domestic_response(body: &str) -> FxResult<DomesticRatePatch> {
    let response: DailyResponse =
        serde_json::from_str(body).map_err(|e| FxError::parse(FEED_NAME, e.to_string()))?;

    let mut rates = BTreeMap::new();
    for currency in Currency::tracked() {
        let Some(raw) = response.valute.get(currency.code()) else {
            continue;
        };

        let valuation: Valuation = serde_json::from_value(raw.clone())
            .map_err(|e| FxError::parse(FEED_NAME, format!("{currency}: {e}")))?;

        let rate = valuation
            .value
            .checked_div(valuation.nominal)
            .ok_or_else(|| FxError::parse(FEED_NAME, format!("{currency}: zero nominal")))?;
        rates.insert(currency, rate);
    }

    Ok(DomesticRatePatch { rates })
}

/// Client for the central bank daily JSON feed.
pub struct CbrDailyFeed {
    client: Client,
    url: String,
}

impl CbrDailyFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        Ok(Self {
            client: http::build_client(timeout)?,
            url: url.into(),
        })
    }

    async fn try_fetch(&self) -> FxResult<DomesticRatePatch> {
        let body = http::get_text(&self.client, FEED_NAME, &self.url).await?;
        parse_domestic_response(&body)
    }
}

#[async_trait]
impl DomesticRateFeed for CbrDailyFeed {
    fn name(&self) -> &str {
        FEED_NAME
    }

    async fn fetch_patch(&self) -> Option<DomesticRatePatch> {
        match self.try_fetch().await {
            Ok(patch) if patch.is_empty() => {
                warn!(feed = FEED_NAME, "Feed has no tracked currencies");
                None
            }
            Ok(patch) => {
                debug!(feed = FEED_NAME, count = patch.len(), "Got domestic rates");
                Some(patch)
            }
            Err(e) => {
                warn!(feed = FEED_NAME, error = %e, "Domestic feed unavailable");
                None
            }
        }
    }
}

/// Mock domestic feed for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockDomesticFeed {
    patch: std::sync::Mutex<Option<DomesticRatePatch>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockDomesticFeed {
    /// Create a feed that reports itself unavailable.
    pub fn unavailable() -> Self {
        Self {
            patch: std::sync::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Create a feed returning the given rates.
    pub fn with_rates(rates: &[(&str, Decimal)]) -> Self {
        let feed = Self::unavailable();
        feed.set_rates(rates);
        feed
    }

    pub fn set_rates(&self, rates: &[(&str, Decimal)]) {
        let patch = DomesticRatePatch::from_rates(
            rates.iter().map(|(code, rate)| (Currency::new(code), *rate)),
        );
        *self.patch.lock().unwrap() = Some(patch);
    }

    pub fn set_unavailable(&self) {
        *self.patch.lock().unwrap() = None;
    }

    /// Number of fetches attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl DomesticRateFeed for MockDomesticFeed {
    fn name(&self) -> &str {
        "mock-domestic"
    }

    async fn fetch_patch(&self) -> Option<DomesticRatePatch> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.patch.lock().unwrap().clone()
    }
}
