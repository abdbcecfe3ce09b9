//! Price samples and their fixed-precision rendering.
//!
//! Every price in the bot is a `rust_decimal::Decimal` from the moment it
//! is parsed out of a provider payload until it is rendered for the channel.
//! Floating point never enters the pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits shown in a published price.
pub const DISPLAY_SCALE: u32 = 3;

/// A price observed from one quote source.
///
/// Immutable once created: the fields are private and only readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSample {
    value: Decimal,
    source_name: String,
    acquired_at: DateTime<Utc>,
}

impl PriceSample {
    /// Create a sample stamped with the current UTC time.
    pub fn new(value: Decimal, source_name: impl Into<String>) -> Self {
        Self::at(value, source_name, Utc::now())
    }

    /// Create a sample with an explicit acquisition time.
    pub fn at(
        value: Decimal,
        source_name: impl Into<String>,
        acquired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            value,
            source_name: source_name.into(),
            acquired_at,
        }
    }

    /// Raw decimal value as reported by the provider.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Name of the quote source that produced this sample.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// When the sample was acquired.
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Value truncated to [`DISPLAY_SCALE`] digits.
    pub fn display_value(&self) -> DisplayPrice {
        DisplayPrice::truncate(self.value)
    }
}

/// Whether an acquired price came from the network in this cycle or
/// from the last-known-good cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Fetched during the current acquisition.
    Fresh,
    /// Every round failed; this is the cached last-known-good value.
    Stale,
}

impl Freshness {
    /// `true` for the cache-hit path.
    pub fn is_stale(self) -> bool {
        matches!(self, Self::Stale)
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Stale => write!(f, "stale"),
        }
    }
}

/// A price truncated toward zero to exactly three fractional digits.
///
/// `2.2678` becomes `2.267`, never `2.268`. Display always renders three
/// digits, padding with zeros (`2` renders as `2.000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DisplayPrice(Decimal);

impl DisplayPrice {
    /// Truncate `value` to [`DISPLAY_SCALE`] fractional digits.
    pub fn truncate(value: Decimal) -> Self {
        let mut truncated =
            value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::ToZero);
        truncated.rescale(DISPLAY_SCALE);
        Self(truncated)
    }

    /// The truncated decimal.
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for DisplayPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}
