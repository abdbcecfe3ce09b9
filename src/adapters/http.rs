//! Shared HTTP Context - One Lazily-Built reqwest Client
//!
//! Quote sources and the Telegram sink all go through the same client so
//! connection pools are shared across requests and cycles. The client is
//! built on first use and released exactly once when the context drops.

use std::time::Duration;

use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Owner of the outbound HTTP client.
#[derive(Debug)]
pub struct HttpContext {
  client: OnceCell<Client>,
  user_agent: String,
  connect_timeout: Duration,
}

impl HttpContext {
  /// Create an empty context; no client is built yet.
  pub fn new(user_agent: impl Into<String>, connect_timeout: Duration) -> Self {
    Self {
      client: OnceCell::new(),
      user_agent: user_agent.into(),
      connect_timeout,
    }
  }

  /// The shared client, built on the first call.
  pub async fn client(&self) -> Result<&Client, reqwest::Error> {
    self
      .client
      .get_or_try_init(|| async {
        debug!(user_agent = %self.user_agent, "Building shared HTTP client");
        Client::builder()
          .user_agent(self.user_agent.as_str())
          .connect_timeout(self.connect_timeout)
          .pool_max_idle_per_host(2)
          .build()
      })
      .await
  }

  /// Whether the client has been built.
  pub fn is_initialized(&self) -> bool {
    self.client.initialized()
  }
}

impl Drop for HttpContext {
  fn drop(&mut self) {
    if self.client.initialized() {
      info!("Shared HTTP client released");
    }
  }
}
