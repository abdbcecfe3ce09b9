//! Telemetry Port - Observability Hooks for the Publishing Pipeline
//!
//! Use cases report what happened; adapters decide whether that becomes a
//! Prometheus sample, a health flag, or nothing at all.

use std::time::Duration;

use crate::domain::price::{DisplayPrice, Freshness};

/// How a scheduler cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
  /// A price was delivered to the channel.
  Published { freshness: Freshness },
  /// No price could be acquired and nothing was cached.
  NoPrice,
  /// A price was acquired but the sink refused or failed delivery.
  PublishFailed,
  /// The cycle errored or panicked unexpectedly.
  Faulted,
}

impl CycleOutcome {
  /// Label used for metric series.
  pub fn label(self) -> &'static str {
    match self {
      Self::Published { freshness: Freshness::Fresh } => "published",
      Self::Published { freshness: Freshness::Stale } => "published_stale",
      Self::NoPrice => "no_price",
      Self::PublishFailed => "publish_failed",
      Self::Faulted => "faulted",
    }
  }
}

/// Receiver of pipeline events.
///
/// Methods are synchronous and must not block: they run inline in the
/// scheduler's single control flow.
pub trait Telemetry: Send + Sync {
  /// A source returned a valid price.
  fn source_succeeded(&self, source: &str, latency: Duration);

  /// A source failed for the given reason label.
  fn source_failed(&self, source: &str, reason: &str);

  /// Acquisition fell back to the last-known-good value.
  fn stale_fallback(&self);

  /// A price was delivered to the channel.
  fn price_published(&self, price: DisplayPrice);

  /// A cycle finished.
  fn cycle_finished(&self, outcome: CycleOutcome);
}

/// Telemetry sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
  fn source_succeeded(&self, _source: &str, _latency: Duration) {}
  fn source_failed(&self, _source: &str, _reason: &str) {}
  fn stale_fallback(&self) {}
  fn price_published(&self, _price: DisplayPrice) {}
  fn cycle_finished(&self, _outcome: CycleOutcome) {}
}
