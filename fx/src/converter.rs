//! Currency converter: reconciles the rate sources and owns the cache.

use std::sync::Arc;

use ratebridge_common::{involves_domestic, Currency, DurationExt};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, RateCache};
use crate::config::ConverterConfig;
use crate::domestic::{CbrDailyFeed, DomesticRateFeed};
use crate::error::{FxError, FxResult};
use crate::provider::{ExchangeRateApiProvider, RateProvider};
use crate::table::RateTable;

/// Answers rate and conversion queries.
///
/// Rates come from the primary [`RateProvider`]. When a table for USD or EUR
/// quotes the domestic currency, the domestic entry is replaced by the
/// national-bank rate if the [`DomesticRateFeed`] has one. Tables are cached
/// per base currency for the configured freshness window.
///
/// All currency arguments are normalized, so `"usd"` and `"USD"` share a
/// cache entry.
pub struct Converter {
    provider: Arc<dyn RateProvider>,
    domestic: Arc<dyn DomesticRateFeed>,
    cache: RateCache,
    config: ConverterConfig,
}

impl Converter {
    /// Create a converter over the given sources.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        domestic: Arc<dyn DomesticRateFeed>,
        config: ConverterConfig,
    ) -> Self {
        Self {
            provider,
            domestic,
            cache: RateCache::new(),
            config,
        }
    }

    /// Create a converter talking to the configured HTTP sources.
    pub fn from_config(config: ConverterConfig) -> FxResult<Self> {
        config.validate()?;

        let timeout = config.request_timeout.as_std();

        let provider = ExchangeRateApiProvider::new(config.api_url.clone(), timeout)?;
        let domestic = CbrDailyFeed::new(config.domestic_feed_url.clone(), timeout)?;

        Ok(Self::new(Arc::new(provider), Arc::new(domestic), config))
    }

    /// Get the rate table for `base`, from cache when fresh.
    #[instrument(skip(self))]
    pub async fn get_exchange_rates(&self, base: &str, force_update: bool) -> FxResult<RateTable> {
        self.resolve_table(&Currency::new(base), force_update).await
    }

    /// Convert `amount` of `from` into `to`.
    #[instrument(skip(self))]
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        force_update: bool,
    ) -> FxResult<Decimal> {
        let (from, to) = (Currency::new(from), Currency::new(to));
        if from == to {
            return Ok(amount);
        }

        let rate = self.resolve_rate(&from, &to, force_update).await?;
        let converted = amount
            .checked_mul(rate)
            .ok_or_else(|| FxError::AmountOverflow {
                amount,
                from: from.clone(),
                to: to.clone(),
            })?;

        info!(
            from = %from,
            to = %to,
            rate = %rate,
            converted = %converted,
            "Conversion completed"
        );

        Ok(converted)
    }

    /// Units of `to` that one unit of `from` buys.
    #[instrument(skip(self))]
    pub async fn get_rate(&self, from: &str, to: &str, force_update: bool) -> FxResult<Decimal> {
        let (from, to) = (Currency::new(from), Currency::new(to));
        if from == to {
            return Ok(Decimal::ONE);
        }

        self.resolve_rate(&from, &to, force_update).await
    }

    /// Every currency quoted against `base`, plus `base` itself, sorted.
    ///
    /// Returns an empty list when the rates cannot be fetched.
    #[instrument(skip(self))]
    pub async fn get_available_currencies(&self, base: &str) -> Vec<Currency> {
        match self.resolve_table(&Currency::new(base), false).await {
            Ok(table) => table.currencies(),
            Err(e) => {
                warn!(error = %e, "No currencies available");
                Vec::new()
            }
        }
    }

    /// Drop every cached table.
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Rate cache cleared");
    }

    /// Cache statistics against the configured freshness window.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(self.config.freshness_window)
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    async fn resolve_rate(
        &self,
        from: &Currency,
        to: &Currency,
        force_update: bool,
    ) -> FxResult<Decimal> {
        // Domestic pairs always go back to the sources.
        let force_update = force_update || involves_domestic(from, to);

        let table = self.resolve_table(from, force_update).await?;
        table.rate(to).ok_or_else(|| FxError::RateNotAvailable {
            base: from.clone(),
            quote: to.clone(),
        })
    }

    async fn resolve_table(&self, base: &Currency, force_update: bool) -> FxResult<RateTable> {
        if !force_update {
            if let Some(cached) = self.cache.get_fresh(base, self.config.freshness_window) {
                debug!("Using cached rates");
                return Ok(cached);
            }
        }

        let mut table = self.provider.fetch_rates(base).await.map_err(|e| {
            warn!(provider = self.provider.name(), base = %base, error = %e, "Rate fetch failed");
            e
        })?;

        if base.is_tracked() && table.contains(&Currency::rub()) {
            self.apply_domestic_patch(base, &mut table).await;
        }

        self.cache.put(base, table.clone());

        info!(
            base = %base,
            source = %table.source,
            count = table.rates.len(),
            "Rates refreshed"
        );

        Ok(table)
    }

    async fn apply_domestic_patch(&self, base: &Currency, table: &mut RateTable) {
        let Some(patch) = self.domestic.fetch_patch().await else {
            debug!(base = %base, "Keeping provider domestic rate");
            return;
        };

        match patch.rate_for(base) {
            Some(rate) => {
                table.apply_domestic_rate(rate, self.domestic.name());
                debug!(base = %base, rate = %rate, "Applied domestic rate");
            }
            None => debug!(base = %base, "Domestic feed has no rate for base"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domestic::MockDomesticFeed;
    use crate::provider::MockRateProvider;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    struct Setup {
        converter: Converter,
        provider: Arc<MockRateProvider>,
        domestic: Arc<MockDomesticFeed>,
    }

    fn setup_with(config: ConverterConfig) -> Setup {
        let provider = Arc::new(MockRateProvider::new("mock-api"));
        provider.set_rates("USD", &[("EUR", dec!(0.9)), ("RUB", dec!(95.0))]);
        provider.set_rates("EUR", &[("USD", dec!(1.1)), ("RUB", dec!(104.0))]);
        provider.set_rates("GBP", &[("USD", dec!(1.25)), ("RUB", dec!(120.0))]);
        provider.set_rates("RUB", &[("USD", dec!(0.0105)), ("RUB", dec!(1))]);

        let domestic = Arc::new(MockDomesticFeed::with_rates(&[
            ("USD", dec!(91.5)),
            ("EUR", dec!(99.2)),
        ]));

        let converter = Converter::new(provider.clone(), domestic.clone(), config);
        Setup {
            converter,
            provider,
            domestic,
        }
    }

    fn setup() -> Setup {
        setup_with(ConverterConfig::default())
    }

    #[test]
    fn test_from_config() {
        let converter = Converter::from_config(ConverterConfig::default()).unwrap();
        assert_eq!(converter.config().request_timeout, Duration::seconds(10));

        let invalid = ConverterConfig::default().with_freshness_window(Duration::zero());
        assert!(matches!(
            Converter::from_config(invalid),
            Err(FxError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_same_currency_convert_is_identity() {
        let s = setup();

        let result = s.converter.convert(dec!(123.45), "zzz", "ZZZ", true).await.unwrap();

        assert_eq!(result, dec!(123.45));
        assert_eq!(s.provider.calls(), 0);
        assert_eq!(s.domestic.calls(), 0);
        assert!(s.converter.cache.is_empty());
    }

    #[tokio::test]
    async fn test_same_currency_rate_is_one() {
        let s = setup();

        assert_eq!(s.converter.get_rate("rub", "RUB", false).await.unwrap(), Decimal::ONE);
        assert_eq!(s.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_domestic_rate_is_patched() {
        let s = setup();

        let table = s.converter.get_exchange_rates("USD", false).await.unwrap();

        assert_eq!(table.rate(&Currency::rub()), Some(dec!(91.5)));
        assert_eq!(table.rate(&Currency::eur()), Some(dec!(0.9)));
        assert_eq!(table.source, "mock-api+mock-domestic");

        let cached = s.converter.cache.get(&Currency::usd()).unwrap();
        assert_eq!(cached, table);
    }

    #[tokio::test]
    async fn test_convert_uses_table_rate() {
        let s = setup();

        let eur = s.converter.convert(dec!(100), "USD", "EUR", false).await.unwrap();

        assert_eq!(eur, dec!(90));
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_sources() {
        let s = setup();

        let first = s.converter.get_exchange_rates("USD", false).await.unwrap();
        let second = s.converter.get_exchange_rates("usd", false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(s.provider.calls(), 1);
        assert_eq!(s.domestic.calls(), 1);
    }

    #[tokio::test]
    async fn test_force_update_refetches() {
        let s = setup();

        s.converter.get_exchange_rates("USD", false).await.unwrap();
        s.converter.get_exchange_rates("USD", true).await.unwrap();

        assert_eq!(s.provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_domestic_side_forces_refresh() {
        let s = setup();

        s.converter.get_exchange_rates("USD", false).await.unwrap();
        assert_eq!(s.provider.calls(), 1);
        assert_eq!(s.domestic.calls(), 1);

        s.domestic.set_rates(&[("USD", dec!(92.0))]);
        let rate = s.converter.get_rate("usd", "rub", false).await.unwrap();

        assert_eq!(rate, dec!(92.0));
        assert_eq!(s.provider.calls(), 2);
        assert_eq!(s.domestic.calls(), 2);

        let rub = s.converter.convert(dec!(10), "USD", "RUB", false).await.unwrap();
        assert_eq!(rub, dec!(920.0));
        assert_eq!(s.provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_non_domestic_pair_uses_cache() {
        let s = setup();

        s.converter.convert(dec!(1), "USD", "EUR", false).await.unwrap();
        s.converter.get_rate("USD", "EUR", false).await.unwrap();

        assert_eq!(s.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_domestic_base_skips_feed() {
        let s = setup();

        let rate = s.converter.get_rate("RUB", "USD", false).await.unwrap();

        assert_eq!(rate, dec!(0.0105));
        assert_eq!(s.provider.calls(), 1);
        assert_eq!(s.domestic.calls(), 0);
    }

    #[tokio::test]
    async fn test_untracked_base_keeps_provider_rate() {
        let s = setup();

        let table = s.converter.get_exchange_rates("GBP", false).await.unwrap();

        assert_eq!(table.rate(&Currency::rub()), Some(dec!(120.0)));
        assert_eq!(s.domestic.calls(), 0);
    }

    #[tokio::test]
    async fn test_patch_without_base_entry_is_ignored() {
        let s = setup();
        s.domestic.set_rates(&[("EUR", dec!(99.2))]);

        let table = s.converter.get_exchange_rates("USD", false).await.unwrap();

        assert_eq!(table.rate(&Currency::rub()), Some(dec!(95.0)));
        assert_eq!(table.source, "mock-api");
    }

    #[tokio::test]
    async fn test_feed_failure_does_not_fail_fetch() {
        let s = setup();
        s.domestic.set_unavailable();

        let table = s.converter.get_exchange_rates("USD", false).await.unwrap();

        assert_eq!(table.rate(&Currency::rub()), Some(dec!(95.0)));
        assert_eq!(s.domestic.calls(), 1);
        assert_eq!(s.converter.cache.get(&Currency::usd()), Some(table));
    }

    #[tokio::test]
    async fn test_unknown_target_is_error() {
        let s = setup();

        let result = s.converter.get_rate("USD", "ZZZ", false).await;
        assert!(matches!(result, Err(FxError::RateNotAvailable { .. })));

        let result = s.converter.convert(dec!(5), "USD", "ZZZ", false).await;
        assert!(matches!(result, Err(FxError::RateNotAvailable { .. })));
    }

    #[tokio::test]
    async fn test_overflowing_amount_is_error() {
        let s = setup();
        s.domestic.set_unavailable();

        let result = s.converter.convert(Decimal::MAX, "USD", "RUB", false).await;
        assert!(matches!(result, Err(FxError::AmountOverflow { .. })));

        // The fetched table is still cached and usable
        let eur = s.converter.convert(dec!(100), "USD", "EUR", false).await.unwrap();
        assert_eq!(eur, dec!(90));
        assert_eq!(s.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_cache_untouched() {
        let s = setup();
        let original = s.converter.get_exchange_rates("USD", false).await.unwrap();

        s.provider.set_failing(true);
        let result = s.converter.get_exchange_rates("USD", true).await;

        assert!(matches!(result, Err(FxError::Network { .. })));
        assert_eq!(s.converter.cache.get(&Currency::usd()), Some(original));
    }

    #[tokio::test]
    async fn test_available_currencies() {
        let s = setup();

        let codes = s.converter.get_available_currencies("usd").await;

        assert_eq!(codes, vec![Currency::eur(), Currency::rub(), Currency::usd()]);
    }

    #[tokio::test]
    async fn test_available_currencies_empty_on_failure() {
        let s = setup();
        s.provider.set_failing(true);

        assert!(s.converter.get_available_currencies("USD").await.is_empty());
        assert!(s.converter.get_available_currencies("XYZ").await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let s = setup();

        s.converter.get_exchange_rates("USD", false).await.unwrap();
        s.converter.get_exchange_rates("EUR", false).await.unwrap();
        assert_eq!(s.converter.cache_stats().total_entries, 2);

        s.converter.clear_cache();
        assert!(s.converter.cache.get(&Currency::usd()).is_none());
        assert!(s.converter.cache.get(&Currency::eur()).is_none());

        s.converter.get_exchange_rates("USD", false).await.unwrap();
        assert_eq!(s.provider.calls(), 3);
        assert_eq!(s.domestic.calls(), 3);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched() {
        let config = ConverterConfig::default().with_freshness_window(Duration::milliseconds(20));
        let s = setup_with(config);

        s.converter.get_exchange_rates("EUR", false).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        let table = s.converter.get_exchange_rates("EUR", false).await.unwrap();

        assert_eq!(s.provider.calls(), 2);
        assert_eq!(table.rate(&Currency::rub()), Some(dec!(99.2)));
    }
}
