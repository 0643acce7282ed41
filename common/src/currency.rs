//! Currency codes for RateBridge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Code of the domestic currency priced by the national-bank feed.
pub const DOMESTIC_CODE: &str = "RUB";

/// Foreign currencies the national-bank feed is consulted for.
pub const TRACKED_CODES: [&str; 2] = ["USD", "EUR"];

/// ISO-like currency code.
///
/// Codes are trimmed and upper-cased on construction, so `" usd"` and `"USD"`
/// compare equal. No check is made that the code names a real currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Whether this is the domestic currency.
    pub fn is_domestic(&self) -> bool {
        self.0 == DOMESTIC_CODE
    }

    /// Whether the national-bank feed publishes a rate for this currency.
    pub fn is_tracked(&self) -> bool {
        TRACKED_CODES.contains(&self.0.as_str())
    }

    pub fn rub() -> Self {
        Self::new(DOMESTIC_CODE)
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    /// The currencies the national-bank feed is consulted for.
    pub fn tracked() -> [Self; 2] {
        TRACKED_CODES.map(Self::new)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True when either side of a pair is the domestic currency.
pub fn involves_domestic(from: &Currency, to: &Currency) -> bool {
    from.is_domestic() || to.is_domestic()
}
