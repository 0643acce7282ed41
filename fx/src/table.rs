//! Rate tables returned by the primary source.

use std::collections::BTreeMap;

use ratebridge_common::{now, Currency, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All rates quoted against one base currency.
///
/// `rates[quote]` is how many units of `quote` one unit of `base` buys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// Base currency.
    pub base: Currency,
    /// Rates keyed by quote currency.
    pub rates: BTreeMap<Currency, Decimal>,
    /// When the rates were fetched.
    pub fetched_at: Timestamp,
    /// Which source(s) produced the table.
    pub source: String,
}

impl RateTable {
    /// Create a table stamped with the current time.
    pub fn new(
        base: Currency,
        rates: BTreeMap<Currency, Decimal>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            base,
            rates,
            fetched_at: now(),
            source: source.into(),
        }
    }

    /// Rate for a quote currency.
    pub fn rate(&self, quote: &Currency) -> Option<Decimal> {
        self.rates.get(quote).copied()
    }

    /// Units of base one unit of `quote` buys.
    pub fn inverse_rate(&self, quote: &Currency) -> Option<Decimal> {
        let rate = self.rate(quote)?;
        Decimal::ONE.checked_div(rate)
    }

    pub fn contains(&self, quote: &Currency) -> bool {
        self.rates.contains_key(quote)
    }

    /// Overwrite the domestic-currency entry with an authoritative value.
    ///
    /// Does nothing when the table has no domestic entry to replace.
    pub fn apply_domestic_rate(&mut self, rate: Decimal, patch_source: &str) -> bool {
        match self.rates.get_mut(&Currency::rub()) {
            Some(slot) => {
                *slot = rate;
                self.source = format!("{}+{}", self.source, patch_source);
                true
            }
            None => false,
        }
    }

    /// Quote currencies plus the base, sorted and deduplicated.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut codes: Vec<Currency> = self.rates.keys().cloned().collect();
        if !self.rates.contains_key(&self.base) {
            codes.push(self.base.clone());
            codes.sort();
        }
        codes
    }
}
