//! Quote Source Chain - Priority-Ordered Single Pass
//!
//! Tries each quote source in ascending priority and stops at the first
//! valid price. There is no aggregation across sources: the first answer
//! wins and lower-priority sources are never contacted.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::domain::price::PriceSample;
use crate::ports::quote_source::{QuoteSource, SourceUnavailable};
use crate::ports::telemetry::Telemetry;

/// Every source in the chain failed during one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFailed {
  /// `(source name, reason)` in the order the sources were tried.
  pub failures: Vec<(String, SourceUnavailable)>,
}

impl fmt::Display for ChainFailed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "all {} quote sources failed", self.failures.len())?;
    for (i, (name, reason)) in self.failures.iter().enumerate() {
      let sep = if i == 0 { ": " } else { "; " };
      write!(f, "{sep}{name}: {reason}")?;
    }
    Ok(())
  }
}

impl std::error::Error for ChainFailed {}

/// Fixed, priority-ordered list of quote sources.
pub struct QuoteSourceChain {
  /// Sources sorted by ascending priority (stable for ties).
  sources: Vec<Arc<dyn QuoteSource>>,
  /// Per-source success/failure reporting.
  telemetry: Arc<dyn Telemetry>,
}

impl QuoteSourceChain {
  /// Build a chain; sources are ordered by priority here, once.
  pub fn new(
    mut sources: Vec<Arc<dyn QuoteSource>>,
    telemetry: Arc<dyn Telemetry>,
  ) -> Self {
    sources.sort_by_key(|s| s.priority());
    Self { sources, telemetry }
  }

  /// Source names in trial order.
  pub fn source_names(&self) -> Vec<&str> {
    self.sources.iter().map(|s| s.name()).collect()
  }

  /// Number of sources in the chain.
  pub fn len(&self) -> usize {
    self.sources.len()
  }

  /// Whether the chain has no sources at all.
  pub fn is_empty(&self) -> bool {
    self.sources.is_empty()
  }

  /// One pass over the chain.
  ///
  /// Each fetch is additionally bounded by `timeout_per_source`, so a
  /// source that ignores its own timeout still cannot stall the pass.
  #[instrument(skip(self), name = "chain_pass")]
  pub async fn try_all(
    &self,
    timeout_per_source: Duration,
  ) -> Result<PriceSample, ChainFailed> {
    let mut failures = Vec::with_capacity(self.sources.len());

    for source in &self.sources {
      let started = Instant::now();
      let result =
        match tokio::time::timeout(timeout_per_source, source.fetch(timeout_per_source))
          .await
        {
          Ok(result) => result,
          Err(_) => Err(SourceUnavailable::Timeout(timeout_per_source)),
        };

      match result {
        Ok(sample) => {
          let latency = started.elapsed();
          self.telemetry.source_succeeded(source.name(), latency);
          debug!(
            source = source.name(),
            price = %sample.value(),
            latency_ms = latency.as_millis() as u64,
            "Quote source answered"
          );
          return Ok(sample);
        }
        Err(reason) => {
          self.telemetry.source_failed(source.name(), reason.kind());
          warn!(
            source = source.name(),
            priority = source.priority(),
            error = %reason,
            "Quote source unavailable"
          );
          failures.push((source.name().to_string(), reason));
        }
      }
    }

    Err(ChainFailed { failures })
  }
}
