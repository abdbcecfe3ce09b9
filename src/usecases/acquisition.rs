//! Price Acquisition - Retry Rounds with Last-Known-Good Fallback
//!
//! Wraps the quote source chain with a bounded number of rounds and a fixed
//! backoff between them. The most recent successful sample is cached for the
//! lifetime of the process and served only when every round fails.
//!
//! A momentary outage of every provider must not silence the channel when a
//! recent value is known; an outage before any value was ever obtained
//! surfaces as `NoPriceAvailable` instead of an invented value.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::config::AcquisitionConfig;
use crate::domain::price::{Freshness, PriceSample};
use crate::ports::telemetry::Telemetry;

use super::source_chain::{ChainFailed, QuoteSourceChain};

/// Acquisition exhausted every round and had nothing cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
  #[error("no price available after {rounds} rounds: {last_failure}")]
  NoPriceAvailable {
    rounds: u32,
    last_failure: ChainFailed,
  },
}

/// Result of a successful `acquire()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
  pub sample: PriceSample,
  pub freshness: Freshness,
}

/// Retry policy for one acquisition.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Maximum chain passes per acquisition.
  pub rounds: u32,
  /// Pause between failed passes (not after the last).
  pub backoff: Duration,
  /// Timeout handed to each source fetch.
  pub timeout_per_source: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      rounds: 3,
      backoff: Duration::from_secs(2),
      timeout_per_source: Duration::from_secs(15),
    }
  }
}

impl From<&AcquisitionConfig> for RetryPolicy {
  fn from(config: &AcquisitionConfig) -> Self {
    Self {
      rounds: config.rounds,
      backoff: Duration::from_secs(config.backoff_secs),
      timeout_per_source: Duration::from_secs(config.request_timeout_secs),
    }
  }
}

/// Process-lifetime acquisition state.
///
/// `last_good` always holds the most recent success in acquisition order,
/// whatever its wall-clock stamp says. It is never cleared.
#[derive(Debug, Default)]
struct AcquisitionState {
  last_good: Option<PriceSample>,
}

impl AcquisitionState {
  fn remember(&mut self, sample: &PriceSample) {
    self.last_good = Some(sample.clone());
  }
}

/// Chain + retry rounds + last-known-good cache.
pub struct PriceAcquisition {
  chain: QuoteSourceChain,
  policy: RetryPolicy,
  state: AcquisitionState,
  telemetry: Arc<dyn Telemetry>,
}

impl PriceAcquisition {
  pub fn new(
    chain: QuoteSourceChain,
    policy: RetryPolicy,
    telemetry: Arc<dyn Telemetry>,
  ) -> Self {
    Self {
      chain,
      policy,
      state: AcquisitionState::default(),
      telemetry,
    }
  }

  /// Most recent successfully acquired sample, if any.
  pub fn last_good(&self) -> Option<&PriceSample> {
    self.state.last_good.as_ref()
  }

  /// Acquire the current price.
  ///
  /// Runs up to `policy.rounds` passes over the chain, sleeping
  /// `policy.backoff` between failed passes. A fresh sample replaces the
  /// cache; when every pass fails the cached sample is returned as
  /// [`Freshness::Stale`].
  #[instrument(skip(self), name = "acquire")]
  pub async fn acquire(&mut self) -> Result<Acquired, AcquisitionError> {
    let rounds = self.policy.rounds.max(1);
    let mut last_failure = ChainFailed {
      failures: Vec::new(),
    };

    for round in 1..=rounds {
      match self.chain.try_all(self.policy.timeout_per_source).await {
        Ok(sample) => {
          self.state.remember(&sample);
          return Ok(Acquired {
            sample,
            freshness: Freshness::Fresh,
          });
        }
        Err(failed) => {
          warn!(
            round,
            rounds,
            sources = failed.failures.len(),
            "Every quote source failed this round"
          );
          last_failure = failed;
        }
      }

      if round < rounds {
        tokio::time::sleep(self.policy.backoff).await;
      }
    }

    match &self.state.last_good {
      Some(cached) => {
        self.telemetry.stale_fallback();
        warn!(
          price = %cached.value(),
          source = cached.source_name(),
          acquired_at = %cached.acquired_at(),
          stale = true,
          "Falling back to last known good price"
        );
        Ok(Acquired {
          sample: cached.clone(),
          freshness: Freshness::Stale,
        })
      }
      None => {
        error!(rounds, "No price available and nothing cached");
        Err(AcquisitionError::NoPriceAvailable {
          rounds,
          last_failure,
        })
      }
    }
  }

  /// Log the chain layout once at startup.
  pub fn log_layout(&self) {
    info!(
      sources = ?self.chain.source_names(),
      rounds = self.policy.rounds,
      backoff_ms = self.policy.backoff.as_millis() as u64,
      timeout_ms = self.policy.timeout_per_source.as_millis() as u64,
      "Price acquisition ready"
    );
  }
}
