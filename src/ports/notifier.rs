//! Notification Sink Port - Outbound Channel Delivery
//!
//! The publisher hands a channel identifier and a pre-rendered text to the
//! sink. Transport details (Telegram Bot API, HTTP) stay in the adapter.

use async_trait::async_trait;
use thiserror::Error;

/// Markup dialect the sink should apply to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
  /// Plain text, no markup.
  Plain,
  /// HTML emphasis tags (`<b>`, `<i>`).
  Html,
}

impl RenderMode {
  /// Wire name expected by Telegram's `parse_mode`.
  pub fn parse_mode(self) -> Option<&'static str> {
    match self {
      Self::Plain => None,
      Self::Html => Some("HTML"),
    }
  }
}

/// Delivery failure reported by a notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
  /// Network failure before a response was received.
  #[error("transport error: {0}")]
  Transport(String),
  /// Credential rejected by the service.
  #[error("unauthorized: {0}")]
  Unauthorized(String),
  /// Destination channel does not exist or the bot cannot post there.
  #[error("invalid channel {channel}: {reason}")]
  InvalidChannel { channel: String, reason: String },
  /// Service asked us to slow down.
  #[error("rate limited, retry after {retry_after_secs}s")]
  RateLimited { retry_after_secs: u64 },
  /// Any other rejection.
  #[error("rejected ({code}): {description}")]
  Rejected { code: u16, description: String },
}

/// Outbound message sink (Telegram channel, chat webhook, ...).
#[async_trait]
pub trait NotificationSink: Send + Sync {
  /// Deliver `text` to `channel` rendered with `mode`.
  async fn send(
    &self,
    channel: &str,
    text: &str,
    mode: RenderMode,
  ) -> Result<(), PublishError>;
}
