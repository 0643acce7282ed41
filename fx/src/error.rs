//! FX error types.

use ratebridge_common::Currency;
use thiserror::Error;

/// Errors that can occur while resolving rates.
#[derive(Debug, Error)]
pub enum FxError {
    /// Transport-level failure talking to a rate source.
    #[error("Network error from {source_name}: {message}")]
    Network {
        source_name: String,
        message: String,
    },

    /// The request to a rate source timed out.
    #[error("Request to {source_name} timed out")]
    Timeout { source_name: String },

    /// The rate source answered with a non-success status.
    #[error("{source_name} returned HTTP {status}")]
    HttpStatus { source_name: String, status: u16 },

    /// Response body was not valid JSON or lacked expected fields.
    #[error("Malformed response from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// The quote currency is absent from the fetched rate table.
    #[error("Rate not available for {base}/{quote}")]
    RateNotAvailable { base: Currency, quote: Currency },

    /// The converted amount does not fit in a decimal.
    #[error("Converting {amount} {from} to {to} overflows")]
    AmountOverflow {
        amount: rust_decimal::Decimal,
        from: Currency,
        to: Currency,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FxError {
    /// Map a reqwest failure onto the network half of the taxonomy.
    pub(crate) fn from_reqwest(source_name: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FxError::Timeout {
                source_name: source_name.to_string(),
            }
        } else if let Some(status) = err.status() {
            FxError::HttpStatus {
                source_name: source_name.to_string(),
                status: status.as_u16(),
            }
        } else {
            FxError::Network {
                source_name: source_name.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn parse(source_name: &str, message: impl Into<String>) -> Self {
        FxError::Parse {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    /// Whether the failure came from talking to a source, as opposed to
    /// a lookup or configuration problem.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            FxError::Network { .. }
                | FxError::Timeout { .. }
                | FxError::HttpStatus { .. }
                | FxError::Parse { .. }
        )
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
