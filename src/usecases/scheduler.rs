//! Scheduler - Minute-Aligned Acquire-and-Publish Loop
//!
//! Two states: `Waiting` for the next UTC minute boundary, `Running` one
//! cycle. Every wait is recomputed from the wall clock. A cycle always hands
//! control back to `Waiting`, whatever happened inside it, and exactly one
//! cycle is in flight at any time.
//!
//! Shutdown is observed at every suspension point: the boundary wait, the
//! in-flight cycle, and the post-fault cool-down.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::price::Freshness;
use crate::domain::schedule::{delay_until_next_minute, next_minute_boundary, Clock};
use crate::ports::telemetry::{CycleOutcome, Telemetry};

use super::acquisition::PriceAcquisition;
use super::publisher::Publisher;

/// Upper bound on the cool-down multiplier after repeated faults.
const MAX_FAULT_BACKOFF_STEPS: u32 = 6;

/// Scheduler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
  Waiting,
  Running,
}

/// Drives one acquire-and-publish cycle per UTC minute.
pub struct Scheduler {
  acquisition: PriceAcquisition,
  publisher: Publisher,
  clock: Arc<dyn Clock>,
  telemetry: Arc<dyn Telemetry>,
  /// Base pause after a faulted cycle.
  fault_cooldown: Duration,
  state: SchedulerState,
  cycles: u64,
}

impl Scheduler {
  pub fn new(
    acquisition: PriceAcquisition,
    publisher: Publisher,
    clock: Arc<dyn Clock>,
    telemetry: Arc<dyn Telemetry>,
    fault_cooldown: Duration,
  ) -> Self {
    Self {
      acquisition,
      publisher,
      clock,
      telemetry,
      fault_cooldown,
      state: SchedulerState::Waiting,
      cycles: 0,
    }
  }

  /// Current state.
  pub fn state(&self) -> SchedulerState {
    self.state
  }

  /// Number of cycles started so far.
  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  /// Acquisition engine (exposes the last-known-good cache).
  pub fn acquisition(&self) -> &PriceAcquisition {
    &self.acquisition
  }

  /// Run until `shutdown_rx` fires.
  #[instrument(skip_all, name = "scheduler")]
  pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) {
    info!(channel = self.publisher.channel(), "Scheduler started");
    let mut consecutive_faults: u32 = 0;

    loop {
      self.state = SchedulerState::Waiting;
      let now = self.clock.now();
      let delay = delay_until_next_minute(now);
      debug!(
        delay_ms = delay.as_millis() as u64,
        next = %next_minute_boundary(now),
        "Waiting for next minute boundary"
      );

      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => break,
        () = tokio::time::sleep(delay) => {}
      }

      self.state = SchedulerState::Running;
      self.cycles += 1;
      let cycle = AssertUnwindSafe(self.run_cycle()).catch_unwind();

      let finished = tokio::select! {
        biased;
        _ = shutdown_rx.recv() => None,
        result = cycle => Some(result),
      };
      let Some(result) = finished else {
        info!("Shutdown requested during an in-flight cycle");
        break;
      };

      match result {
        Ok(_) => consecutive_faults = 0,
        Err(panic) => {
          consecutive_faults = consecutive_faults.saturating_add(1);
          self.telemetry.cycle_finished(CycleOutcome::Faulted);
          let cooldown =
            self.fault_cooldown * consecutive_faults.min(MAX_FAULT_BACKOFF_STEPS);
          error!(
            panic = panic_message(panic.as_ref()),
            consecutive_faults,
            cooldown_ms = cooldown.as_millis() as u64,
            "Cycle faulted, cooling down before the next wait"
          );

          tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            () = tokio::time::sleep(cooldown) => {}
          }
        }
      }
    }

    self.state = SchedulerState::Waiting;
    info!(cycles = self.cycles, "Scheduler stopped");
  }

  /// One acquire-and-publish cycle.
  #[instrument(skip(self), name = "cycle", fields(n = self.cycles))]
  pub async fn run_cycle(&mut self) -> CycleOutcome {
    let outcome = match self.acquisition.acquire().await {
      Err(e) => {
        error!(error = %e, "Skipping publish: no price available");
        CycleOutcome::NoPrice
      }
      Ok(acquired) => {
        let sample = &acquired.sample;
        match self.publisher.publish(sample).await {
          Ok(_) => {
            self.telemetry.price_published(sample.display_value());
            match acquired.freshness {
              Freshness::Fresh => info!(
                price = %sample.display_value(),
                source = sample.source_name(),
                stale = false,
                "Published fresh price"
              ),
              Freshness::Stale => warn!(
                price = %sample.display_value(),
                source = sample.source_name(),
                acquired_at = %sample.acquired_at(),
                stale = true,
                "Published stale price from cache"
              ),
            }
            CycleOutcome::Published {
              freshness: acquired.freshness,
            }
          }
          Err(e) => {
            error!(error = %e, "Publish failed, not retrying this cycle");
            CycleOutcome::PublishFailed
          }
        }
      }
    };

    self.telemetry.cycle_finished(outcome);
    outcome
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(s) = payload.downcast_ref::<&'static str>() {
    s
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.as_str()
  } else {
    "unknown panic"
  }
}
