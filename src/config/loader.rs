//! Configuration Loader - File Loading, Validation, Credentials
//!
//! Handles loading `config.toml`, validating all parameters, and
//! resolving the bot credential and destination channel from the
//! environment. A missing credential is fatal before the scheduler starts.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use super::AppConfig;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
/// Environment variable overriding the destination channel.
pub const CHANNEL_ENV: &str = "CHANNEL_USERNAME";

/// Conditions that abort the process before the first cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
  #[error("BOT_TOKEN is not set")]
  MissingCredential,
  #[error("no destination channel: set CHANNEL_USERNAME or telegram.channel")]
  MissingChannel,
}

/// Secrets and destination resolved at startup.
#[derive(Clone)]
pub struct Credentials {
  pub bot_token: String,
  pub channel: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("bot_token", &"<redacted>")
      .field("channel", &self.channel)
      .finish()
  }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
  /// Parsed from the file at the given path.
  File,
  /// No file at the path; built-in defaults.
  Defaults,
}

impl ConfigOrigin {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::File => "file",
      Self::Defaults => "defaults",
    }
  }
}

/// Load and validate configuration from a TOML file.
///
/// A missing file is not an error: every section has defaults and the
/// credential comes from the environment anyway. Does not log; call
/// [`log_loaded`] once tracing is initialised.
///
/// # Errors
/// Returns detailed error if:
/// - The file exists but can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<(AppConfig, ConfigOrigin)> {
  let path = Path::new(path);

  if !path.exists() {
    return Ok((AppConfig::default(), ConfigOrigin::Defaults));
  }

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
  let config = parse_config(&content)
    .with_context(|| format!("Invalid config file: {}", path.display()))?;
  Ok((config, ConfigOrigin::File))
}

/// Summarize the loaded configuration once tracing is up.
pub fn log_loaded(path: &str, origin: ConfigOrigin, config: &AppConfig) {
  if origin == ConfigOrigin::Defaults {
    info!(path, "No config file, using defaults");
  }
  info!(
    path,
    origin = origin.as_str(),
    sources = config.sources.iter().filter(|s| s.enabled).count(),
    rounds = config.acquisition.rounds,
    timeout_secs = config.acquisition.request_timeout_secs,
    "Configuration loaded successfully"
  );
}

/// Parse and validate TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Resolve credentials from `lookup` (normally `std::env::var`).
pub fn resolve_credentials<F>(config: &AppConfig, lookup: F) -> Result<Credentials, StartupError>
where
  F: Fn(&str) -> Option<String>,
{
  let bot_token = non_blank(lookup(BOT_TOKEN_ENV)).ok_or(StartupError::MissingCredential)?;

  let channel = non_blank(lookup(CHANNEL_ENV))
    .or_else(|| non_blank(config.telegram.channel.clone()))
    .ok_or(StartupError::MissingChannel)?;

  Ok(Credentials { bot_token, channel })
}

fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

/// Resolve credentials from the process environment.
pub fn credentials_from_env(config: &AppConfig) -> Result<Credentials, StartupError> {
  resolve_credentials(config, |key| std::env::var(key).ok())
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - At least one enabled source, unique names, non-empty URLs
/// - Retry rounds in 1..=10
/// - Request timeout in 1..=30 s so a full retry sequence fits the cadence
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    config.sources.iter().any(|s| s.enabled),
    "At least one quote source must be enabled"
  );

  let mut names = HashSet::new();
  for (i, source) in config.sources.iter().enumerate() {
    anyhow::ensure!(!source.name.is_empty(), "Source {i} has an empty name");
    anyhow::ensure!(
      names.insert(source.name.as_str()),
      "Duplicate source name: {}",
      source.name
    );
    anyhow::ensure!(
      source.url.starts_with("http://") || source.url.starts_with("https://"),
      "Source {} has a non-HTTP url: {}",
      source.name,
      source.url
    );
  }

  anyhow::ensure!(
    (1..=10).contains(&config.acquisition.rounds),
    "acquisition.rounds must be in 1..=10, got {}",
    config.acquisition.rounds
  );
  anyhow::ensure!(
    (1..=30).contains(&config.acquisition.request_timeout_secs),
    "acquisition.request_timeout_secs must be in 1..=30, got {}",
    config.acquisition.request_timeout_secs
  );
  anyhow::ensure!(
    config.acquisition.backoff_secs <= 30,
    "acquisition.backoff_secs must be at most 30, got {}",
    config.acquisition.backoff_secs
  );
  anyhow::ensure!(
    config.scheduler.fault_cooldown_secs <= 60,
    "scheduler.fault_cooldown_secs must be at most 60, got {}",
    config.scheduler.fault_cooldown_secs
  );

  if let Some(channel) = &config.telegram.channel {
    anyhow::ensure!(!channel.trim().is_empty(), "telegram.channel must not be empty");
  }
  anyhow::ensure!(
    !config.telegram.api_base.is_empty(),
    "telegram.api_base must not be empty"
  );

  Ok(())
}
