//! Primary rate provider trait and implementations.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use ratebridge_common::Currency;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::{FxError, FxResult};
use crate::http;
use crate::table::RateTable;

/// Trait for multi-currency rate providers.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch every rate quoted against `base`.
    async fn fetch_rates(&self, base: &Currency) -> FxResult<RateTable>;
}

const PROVIDER_NAME: &str = "exchangerate-api";

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: BTreeMap<Currency, Decimal>,
}

/// Parse a `{"rates": {CODE: number}}` body into a table for `base`.
pub fn parse_rates_response(source_name: &str, base: &Currency, body: &str) -> FxResult<RateTable> {
    let response: LatestRatesResponse =
        serde_json::from_str(body).map_err(|e| FxError::parse(source_name, e.to_string()))?;

    Ok(RateTable::new(base.clone(), response.rates, source_name))
}

/// Client for an exchangerate-api style `GET {endpoint}/{BASE}` service.
pub struct ExchangeRateApiProvider {
    client: Client,
    endpoint: String,
}

impl ExchangeRateApiProvider {
    /// Create a provider for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        Ok(Self {
            client: http::build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    fn url_for(&self, base: &Currency) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), base.code())
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_rates(&self, base: &Currency) -> FxResult<RateTable> {
        let body = http::get_text(&self.client, PROVIDER_NAME, &self.url_for(base)).await?;
        let table = parse_rates_response(PROVIDER_NAME, base, &body)?;

        debug!(
            provider = PROVIDER_NAME,
            base = %base,
            count = table.rates.len(),
            "Got rates from provider"
        );

        Ok(table)
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    tables: dashmap::DashMap<Currency, BTreeMap<Currency, Decimal>>,
    calls: std::sync::atomic::AtomicUsize,
    failing: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
            failing: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Set the rates returned for a base currency.
    pub fn set_rates(&self, base: &str, rates: &[(&str, Decimal)]) {
        let rates = rates
            .iter()
            .map(|(code, rate)| (Currency::new(code), *rate))
            .collect();
        self.tables.insert(Currency::new(base), rates);
    }

    /// Make every subsequent fetch fail with a network error.
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of fetches attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self, base: &Currency) -> FxResult<RateTable> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(FxError::Network {
                source_name: self.name.clone(),
                message: "connection refused".to_string(),
            });
        }

        self.tables
            .get(base)
            .map(|rates| RateTable::new(base.clone(), rates.clone(), self.name.clone()))
            .ok_or_else(|| FxError::HttpStatus {
                source_name: self.name.clone(),
                status: 404,
            })
    }
}
