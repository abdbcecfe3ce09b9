//! Configuration Module - TOML-based Publisher Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides via `.env` files.
//! Quote source endpoints and schemas are externalized here; the
//! acquisition layer never hardcodes a provider.

pub mod loader;

use serde::Deserialize;

use crate::adapters::sources::QuoteSchema;
use crate::adapters::telegram::DEFAULT_API_BASE;

/// Top-level publisher configuration.
///
/// Every section is optional in the file; missing sections take the
/// defaults below.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Process identity and logging.
  #[serde(default)]
  pub bot: BotConfig,
  /// Telegram destination.
  #[serde(default)]
  pub telegram: TelegramConfig,
  /// Retry rounds, backoff, request timeout.
  #[serde(default)]
  pub acquisition: AcquisitionConfig,
  /// Scheduler fault handling.
  #[serde(default)]
  pub scheduler: SchedulerConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Quote sources, any order; priority decides trial order.
  #[serde(default = "default_sources")]
  pub sources: Vec<SourceConfig>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      bot: BotConfig::default(),
      telegram: TelegramConfig::default(),
      acquisition: AcquisitionConfig::default(),
      scheduler: SchedulerConfig::default(),
      metrics: MetricsConfig::default(),
      sources: default_sources(),
    }
  }
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable name (also the HTTP user agent).
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

impl Default for BotConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
    }
  }
}

/// Telegram destination configuration.
///
/// The bot token is never read from this file, only from `BOT_TOKEN`.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
  /// Bot API base URL.
  #[serde(default = "default_api_base")]
  pub api_base: String,
  /// Destination channel; `CHANNEL_USERNAME` overrides it.
  #[serde(default)]
  pub channel: Option<String>,
  /// Timeout for Bot API calls in seconds.
  #[serde(default = "default_telegram_timeout")]
  pub timeout_secs: u64,
}

impl Default for TelegramConfig {
  fn default() -> Self {
    Self {
      api_base: default_api_base(),
      channel: None,
      timeout_secs: default_telegram_timeout(),
    }
  }
}

/// Price acquisition configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionConfig {
  /// Chain passes per cycle.
  #[serde(default = "default_rounds")]
  pub rounds: u32,
  /// Pause between failed passes (seconds).
  #[serde(default = "default_backoff")]
  pub backoff_secs: u64,
  /// Per-request timeout (seconds).
  #[serde(default = "default_request_timeout")]
  pub request_timeout_secs: u64,
}

impl Default for AcquisitionConfig {
  fn default() -> Self {
    Self {
      rounds: default_rounds(),
      backoff_secs: default_backoff(),
      request_timeout_secs: default_request_timeout(),
    }
  }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
  /// Base cool-down after a faulted cycle (seconds).
  #[serde(default = "default_fault_cooldown")]
  pub fault_cooldown_secs: u64,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      fault_cooldown_secs: default_fault_cooldown(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export and health probes.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

/// One quote source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
  /// Identifier used in logs and metrics.
  pub name: String,
  /// Lower is tried first.
  pub priority: u32,
  /// Full GET URL including query string.
  pub url: String,
  /// Payload layout.
  pub schema: QuoteSchema,
  /// Disabled sources are skipped when building the chain.
  #[serde(default = "default_true")]
  pub enabled: bool,
}

impl SourceConfig {
  fn new(name: &str, priority: u32, url: &str, schema: QuoteSchema) -> Self {
    Self {
      name: name.to_string(),
      priority,
      url: url.to_string(),
      schema,
      enabled: true,
    }
  }
}

/// TON/USDT chain: KuCoin, OKX, Binance, CoinGecko.
pub fn default_sources() -> Vec<SourceConfig> {
  vec![
    SourceConfig::new(
      "kucoin",
      1,
      "https://api.kucoin.com/api/v1/market/orderbook/level1?symbol=TON-USDT",
      QuoteSchema::Kucoin,
    ),
    SourceConfig::new(
      "okx",
      2,
      "https://www.okx.com/api/v5/market/ticker?instId=TON-USDT",
      QuoteSchema::Okx,
    ),
    SourceConfig::new(
      "binance",
      3,
      "https://api.binance.com/api/v3/ticker/price?symbol=TONUSDT",
      QuoteSchema::Binance,
    ),
    SourceConfig::new(
      "coingecko",
      4,
      "https://api.coingecko.com/api/v3/simple/price?ids=the-open-network&vs_currencies=usd",
      QuoteSchema::Coingecko {
        coin_id: "the-open-network".to_string(),
        vs_currency: "usd".to_string(),
      },
    ),
  ]
}

// Default value functions for serde

fn default_name() -> String {
  "ton-price-publisher".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_api_base() -> String {
  DEFAULT_API_BASE.to_string()
}

fn default_telegram_timeout() -> u64 {
  15
}

fn default_rounds() -> u32 {
  3
}

fn default_backoff() -> u64 {
  2
}

fn default_request_timeout() -> u64 {
  15
}

fn default_fault_cooldown() -> u64 {
  5
}

fn default_true() -> bool {
  true
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}
