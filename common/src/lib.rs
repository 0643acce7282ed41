//! RateBridge Common Types
//!
//! Shared types used across RateBridge crates: normalized currency codes,
//! the domestic/tracked currency set, and time helpers.

pub mod currency;
pub mod time;

pub use currency::*;
pub use time::*;
