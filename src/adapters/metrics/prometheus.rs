//! Prometheus Metrics Registry - Publishing Pipeline Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards:
//! cycle outcomes, per-source health and latency, stale fallbacks, and the
//! last published price. Implements the `Telemetry` port.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::domain::price::DisplayPrice;
use crate::ports::telemetry::{CycleOutcome, Telemetry};

use super::health::HealthState;

/// Centralized Prometheus metrics for the publisher.
///
/// All metrics follow the naming convention `ton_price_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Cycles by outcome label.
    pub cycles: IntCounterVec,
    /// Successful fetches per source.
    pub source_successes: IntCounterVec,
    /// Failed fetches per source and reason.
    pub source_failures: IntCounterVec,
    /// Successful fetch latency per source (seconds).
    pub fetch_latency: HistogramVec,
    /// Cycles that fell back to the cached price.
    pub stale_fallbacks: IntCounter,
    /// Last price delivered to the channel.
    pub last_published_price: Gauge,
    /// Readiness flags flipped by pipeline events.
    health: Arc<HealthState>,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new(health: Arc<HealthState>) -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles = IntCounterVec::new(
            Opts::new("ton_price_cycles_total", "Scheduler cycles by outcome"),
            &["outcome"],
        )?;

        let source_successes = IntCounterVec::new(
            Opts::new(
                "ton_price_source_successes_total",
                "Successful quote fetches per source",
            ),
            &["source"],
        )?;

        let source_failures = IntCounterVec::new(
            Opts::new(
                "ton_price_source_failures_total",
                "Failed quote fetches per source and reason",
            ),
            &["source", "reason"],
        )?;

        let fetch_latency = HistogramVec::new(
            HistogramOpts::new(
                "ton_price_fetch_latency_seconds",
                "Latency of successful quote fetches",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0]),
            &["source"],
        )?;

        let stale_fallbacks = IntCounter::new(
            "ton_price_stale_fallbacks_total",
            "Cycles served from the last known good price",
        )?;

        let last_published_price = Gauge::new(
            "ton_price_last_published_usd",
            "Last price delivered to the channel (truncated)",
        )?;

        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(source_successes.clone()))?;
        registry.register(Box::new(source_failures.clone()))?;
        registry.register(Box::new(fetch_latency.clone()))?;
        registry.register(Box::new(stale_fallbacks.clone()))?;
        registry.register(Box::new(last_published_price.clone()))?;

        Ok(Self {
            registry,
            cycles,
            source_successes,
            source_failures,
            fetch_latency,
            stale_fallbacks,
            last_published_price,
            health,
        })
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(text) => (StatusCode::OK, text),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

impl Telemetry for MetricsRegistry {
    fn source_succeeded(&self, source: &str, latency: Duration) {
        self.source_successes.with_label_values(&[source]).inc();
        self.fetch_latency
            .with_label_values(&[source])
            .observe(latency.as_secs_f64());
    }

    fn source_failed(&self, source: &str, reason: &str) {
        self.source_failures
            .with_label_values(&[source, reason])
            .inc();
    }

    fn stale_fallback(&self) {
        self.stale_fallbacks.inc();
    }

    fn price_published(&self, price: DisplayPrice) {
        if let Some(value) = price.value().to_f64() {
            self.last_published_price.set(value);
        }
        self.health.mark_published();
    }

    fn cycle_finished(&self, outcome: CycleOutcome) {
        self.cycles.with_label_values(&[outcome.label()]).inc();
    }
}
