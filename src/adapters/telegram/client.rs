//! Telegram Sink - Bot API Notification Delivery
//!
//! Implements the `NotificationSink` port over `sendMessage`. The bot token
//! is part of every request path, so URLs are never logged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::adapters::http::HttpContext;
use crate::ports::notifier::{NotificationSink, PublishError, RenderMode};

use super::types::{ApiResponse, BotUser, SendMessageRequest, SentMessage};

/// Default Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API client acting as the notification sink.
pub struct TelegramSink {
  http: Arc<HttpContext>,
  api_base: String,
  token: String,
  timeout: Duration,
}

impl TelegramSink {
  pub fn new(
    http: Arc<HttpContext>,
    api_base: impl Into<String>,
    token: impl Into<String>,
    timeout: Duration,
  ) -> Self {
    Self {
      http,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      token: token.into(),
      timeout,
    }
  }

  fn method_url(&self, method: &str) -> String {
    format!("{}/bot{}/{}", self.api_base, self.token, method)
  }

  /// Verify the credential and return the bot's username.
  #[instrument(skip(self))]
  pub async fn get_me(&self) -> Result<BotUser, PublishError> {
    let client = self
      .http
      .client()
      .await
      .map_err(|e| PublishError::Transport(redact(e)))?;

    let response = client
      .get(self.method_url("getMe"))
      .timeout(self.timeout)
      .send()
      .await
      .map_err(|e| PublishError::Transport(redact(e)))?;

    decode::<BotUser>(response, "").await
  }
}

#[async_trait]
impl NotificationSink for TelegramSink {
  #[instrument(skip(self, text))]
  async fn send(
    &self,
    channel: &str,
    text: &str,
    mode: RenderMode,
  ) -> Result<(), PublishError> {
    let client = self
      .http
      .client()
      .await
      .map_err(|e| PublishError::Transport(redact(e)))?;

    let body = SendMessageRequest {
      chat_id: channel,
      text,
      parse_mode: mode.parse_mode(),
    };

    let response = client
      .post(self.method_url("sendMessage"))
      .timeout(self.timeout)
      .json(&body)
      .send()
      .await
      .map_err(|e| PublishError::Transport(redact(e)))?;

    let sent = decode::<SentMessage>(response, channel).await?;
    debug!(message_id = sent.message_id, "Telegram accepted message");
    Ok(())
  }
}

async fn decode<T: DeserializeOwned>(
  response: reqwest::Response,
  channel: &str,
) -> Result<T, PublishError> {
  let status = response.status().as_u16();
  let body = response
    .text()
    .await
    .map_err(|e| PublishError::Transport(redact(e)))?;
  interpret(status, &body, channel)
}

/// Map an HTTP status and Bot API body to a result.
pub(crate) fn interpret<T: DeserializeOwned>(
  status: u16,
  body: &str,
  channel: &str,
) -> Result<T, PublishError> {
  let envelope: ApiResponse<T> = match serde_json::from_str(body) {
    Ok(envelope) => envelope,
    Err(e) => {
      return Err(PublishError::Rejected {
        code: status,
        description: format!("unreadable response: {e}"),
      });
    }
  };

  if envelope.ok {
    return envelope.result.ok_or_else(|| PublishError::Rejected {
      code: status,
      description: "ok response without result".to_string(),
    });
  }

  let code = envelope.error_code.unwrap_or(status);
  let description = envelope.description.unwrap_or_default();

  Err(match code {
    401 => PublishError::Unauthorized(description),
    429 => PublishError::RateLimited {
      retry_after_secs: envelope
        .parameters
        .and_then(|p| p.retry_after)
        .unwrap_or(1),
    },
    400 | 403 if mentions_chat(&description) => PublishError::InvalidChannel {
      channel: channel.to_string(),
      reason: description,
    },
    _ => PublishError::Rejected { code, description },
  })
}

fn mentions_chat(description: &str) -> bool {
  let lower = description.to_ascii_lowercase();
  lower.contains("chat") || lower.contains("channel")
}

/// reqwest errors embed the request URL, which carries the token.
fn redact(e: reqwest::Error) -> String {
  e.without_url().to_string()
}
