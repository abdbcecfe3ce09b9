//! Quote Source Port - One External Price Provider
//!
//! Every provider (exchange ticker, aggregator API) is reached through this
//! trait, so the fallback chain iterates providers polymorphically and never
//! knows their endpoints or payload layouts.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::price::PriceSample;

/// Why a single quote source could not deliver a price.
///
/// Always non-fatal: the chain logs it and moves to the next source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceUnavailable {
    /// Connection, DNS, TLS or body read failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// No response within the per-request timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// HTTP status outside the 2xx range.
    #[error("unexpected HTTP status {0}")]
    BadStatus(u16),
    /// The payload carried the provider's own failure indicator.
    #[error("provider rejected request (code {0})")]
    Rejected(String),
    /// The payload did not match the provider's schema.
    #[error("malformed payload: {0}")]
    Parse(String),
    /// A numeric field was found but is not a usable price.
    #[error("invalid price: {0}")]
    InvalidPrice(String),
}

impl SourceUnavailable {
    /// Short label for metric series.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::BadStatus(_) => "status",
            Self::Rejected(_) => "rejected",
            Self::Parse(_) => "parse",
            Self::InvalidPrice(_) => "invalid_price",
        }
    }
}

/// A single external provider of the asset's price.
///
/// `name` and `priority` are fixed at construction. Lower priority values
/// are tried first.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Stable identifier used in logs and metrics.
    fn name(&self) -> &str;

    /// Position in the fallback chain (lower = earlier).
    fn priority(&self) -> u32;

    /// Fetch the current price, giving up after `timeout`.
    async fn fetch(&self, timeout: Duration) -> Result<PriceSample, SourceUnavailable>;
}
