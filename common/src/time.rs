//! Time utilities and constants for RateBridge.

use chrono::{DateTime, Duration, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// How long a cached rate table stays fresh (5 minutes).
    pub fn freshness_window() -> Duration {
        Duration::minutes(5)
    }

    /// Per-request HTTP timeout for both rate sources (10 seconds).
    pub fn request_timeout() -> Duration {
        Duration::seconds(10)
    }
}

/// A timestamp (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Age of a timestamp relative to now.
pub fn age_of(timestamp: Timestamp) -> Duration {
    now() - timestamp
}

/// Check if a timestamp is younger than `max_age`.
pub fn is_within(timestamp: Timestamp, max_age: Duration) -> bool {
    age_of(timestamp) < max_age
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
