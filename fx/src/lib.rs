//! RateBridge FX
//!
//! Exchange rate resolution for currency conversion.
//!
//! # Features
//!
//! - A generic multi-currency rate API as the primary source
//! - The national-bank daily feed as a best-effort override for the domestic rate
//! - Per-base-currency rate caching with a freshness window
//! - Conversion, single-rate and currency-list queries
//!
//! # Example
//!
//! ```rust,ignore
//! use ratebridge_fx::{Converter, ConverterConfig};
//! use rust_decimal_macros::dec;
//!
//! let converter = Converter::from_config(ConverterConfig::from_env())?;
//!
//! let eur = converter.convert(dec!(100), "usd", "eur", false).await?;
//! let rate = converter.get_rate("USD", "RUB", false).await?;
//! let codes = converter.get_available_currencies("USD").await;
//! ```

pub mod cache;
pub mod config;
pub mod converter;
pub mod domestic;
pub mod error;
mod http;
pub mod provider;
pub mod table;

pub use cache::{CacheStats, RateCache};
pub use config::ConverterConfig;
pub use converter::Converter;
pub use domestic::{CbrDailyFeed, DomesticRateFeed, DomesticRatePatch};
pub use error::{FxError, FxResult};
pub use provider::{ExchangeRateApiProvider, RateProvider};
pub use table::RateTable;

#[cfg(any(test, feature = "test-utils"))]
pub use domestic::MockDomesticFeed;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
