//! TON Price Publisher — Entry Point
//!
//! Wiring sequence:
//! 1. Load `.env` + config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Resolve BOT_TOKEN / CHANNEL_USERNAME (fatal if missing)
//! 4. Create the shared HTTP context and the Telegram sink, verify the token
//! 5. Spawn health + metrics servers
//! 6. Build quote sources → chain → acquisition → publisher → scheduler
//! 7. Spawn the scheduler loop
//! 8. Wait for SIGINT → graceful shutdown (signal → drain → release client)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use ton_price_publisher::adapters::http::HttpContext;
use ton_price_publisher::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use ton_price_publisher::adapters::sources::build_sources;
use ton_price_publisher::adapters::telegram::TelegramSink;
use ton_price_publisher::config::{self, AppConfig};
use ton_price_publisher::domain::schedule::SystemClock;
use ton_price_publisher::ports::notifier::PublishError;
use ton_price_publisher::ports::telemetry::Telemetry;
use ton_price_publisher::usecases::acquisition::{PriceAcquisition, RetryPolicy};
use ton_price_publisher::usecases::publisher::Publisher;
use ton_price_publisher::usecases::scheduler::Scheduler;
use ton_price_publisher::usecases::source_chain::QuoteSourceChain;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let _ = dotenvy::dotenv();
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let (config, origin) = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();
    config::loader::log_loaded(&config_path, origin, &config);

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        sources = config.sources.iter().filter(|s| s.enabled).count(),
        "Starting TON price publisher"
    );

    // ── 3. Credentials (fatal before the scheduler starts) ──
    let credentials = config::loader::credentials_from_env(&config)
        .context("Fatal startup condition")?;
    info!(channel = %credentials.channel, "Destination channel resolved");

    // ── 4. Shared HTTP context + Telegram sink ──────────────
    let http = Arc::new(HttpContext::new(
        format!("{}/{}", config.bot.name, env!("CARGO_PKG_VERSION")),
        Duration::from_secs(5),
    ));
    let sink = Arc::new(TelegramSink::new(
        Arc::clone(&http),
        config.telegram.api_base.clone(),
        credentials.bot_token.clone(),
        Duration::from_secs(config.telegram.timeout_secs),
    ));
    verify_bot(&sink).await?;

    // ── 5. Metrics + health servers ─────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let health = Arc::new(HealthState::new());
    let metrics = Arc::new(
        MetricsRegistry::new(Arc::clone(&health)).context("Failed to register metrics")?,
    );

    let mut server_handles = Vec::new();
    if config.metrics.enabled {
        let metrics_rx = shutdown_tx.subscribe();
        let bind = config.metrics.bind_address.clone();
        let registry = Arc::clone(&metrics);
        server_handles.push(tokio::spawn(async move {
            if let Err(e) = registry.serve(bind, metrics_rx).await {
                error!(error = %e, "Metrics server failed");
            }
        }));

        let health_rx = shutdown_tx.subscribe();
        let server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
        server_handles.push(tokio::spawn(async move {
            if let Err(e) = server.run(health_rx).await {
                error!(error = %e, "Health server failed");
            }
        }));
    }

    // ── 6. Acquisition pipeline ─────────────────────────────
    let mut scheduler = build_scheduler(&config, &http, sink, &credentials.channel, metrics);

    // ── 7. Scheduler loop ───────────────────────────────────
    let scheduler_rx = shutdown_tx.subscribe();
    let mut scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_rx).await;
    });

    info!("Scheduler spawned, publisher is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
        result = &mut scheduler_handle => {
            if let Err(e) = result {
                error!(error = %e, "Scheduler task ended unexpectedly");
            }
        }
    }

    health.mark_stopping();
    let _ = shutdown_tx.send(());

    if !scheduler_handle.is_finished() {
        if tokio::time::timeout(Duration::from_secs(20), &mut scheduler_handle)
            .await
            .is_err()
        {
            warn!("Scheduler did not stop in time, aborting");
            scheduler_handle.abort();
        }
    }

    for handle in server_handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    // Last owner of the shared client once the scheduler task is gone.
    drop(http);

    info!("Shutdown complete");
    Ok(())
}

/// Wire sources → chain → acquisition → publisher → scheduler.
fn build_scheduler(
    config: &AppConfig,
    http: &Arc<HttpContext>,
    sink: Arc<TelegramSink>,
    channel: &str,
    metrics: Arc<MetricsRegistry>,
) -> Scheduler {
    let telemetry: Arc<dyn Telemetry> = metrics;
    let chain = QuoteSourceChain::new(
        build_sources(&config.sources, http),
        Arc::clone(&telemetry),
    );
    let acquisition = PriceAcquisition::new(
        chain,
        RetryPolicy::from(&config.acquisition),
        Arc::clone(&telemetry),
    );
    acquisition.log_layout();

    Scheduler::new(
        acquisition,
        Publisher::new(sink, channel),
        Arc::new(SystemClock),
        telemetry,
        Duration::from_secs(config.scheduler.fault_cooldown_secs),
    )
}

/// Check the token with `getMe`. A rejected token is fatal; a network
/// failure is not, the first cycle will surface it again.
async fn verify_bot(sink: &TelegramSink) -> Result<()> {
    match sink.get_me().await {
        Ok(me) => {
            info!(
                username = me.username.as_deref().unwrap_or("<none>"),
                "Telegram bot connected"
            );
            Ok(())
        }
        Err(e @ PublishError::Unauthorized(_)) => {
            Err(anyhow::Error::new(e).context("Telegram rejected BOT_TOKEN"))
        }
        Err(e) => {
            warn!(error = %e, "Could not verify Telegram bot, continuing");
            Ok(())
        }
    }
}
