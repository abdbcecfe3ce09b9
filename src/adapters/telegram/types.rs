//! Telegram Bot API Request/Response Types
//!
//! Only the two methods the publisher needs: `getMe` and `sendMessage`.

use serde::{Deserialize, Serialize};

/// `sendMessage` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
  /// `@channelusername` or numeric chat id.
  pub chat_id: &'a str,
  /// Message text, already rendered.
  pub text: &'a str,
  /// `"HTML"` for emphasis markup; omitted for plain text.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parse_mode: Option<&'static str>,
}

/// Envelope wrapping every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
  pub ok: bool,
  pub result: Option<T>,
  pub error_code: Option<u16>,
  pub description: Option<String>,
  pub parameters: Option<ResponseParameters>,
}

/// Extra hints attached to a failed call.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
  /// Seconds to wait before retrying after a 429.
  pub retry_after: Option<u64>,
}

/// `getMe` result.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
  pub id: i64,
  pub is_bot: bool,
  pub username: Option<String>,
}

/// `sendMessage` result (only the id is of interest).
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
  pub message_id: i64,
}
