//! Publisher - Render and Deliver a Price
//!
//! Formats a sample as `<b>2.351 $</b>` and hands it to the notification
//! sink. Delivery is attempted once per cycle; failures go back to the
//! caller for logging and are never retried here.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::price::{DisplayPrice, PriceSample};
use crate::ports::notifier::{NotificationSink, PublishError, RenderMode};

/// Render a price for the channel.
///
/// The value is truncated (never rounded) to three fractional digits.
pub fn format(sample: &PriceSample) -> String {
  format_price(sample.display_value())
}

/// Render an already truncated price.
pub fn format_price(price: DisplayPrice) -> String {
  format!("<b>{price} $</b>")
}

/// Delivers formatted prices to one destination channel.
pub struct Publisher {
  sink: Arc<dyn NotificationSink>,
  channel: String,
}

impl Publisher {
  pub fn new(sink: Arc<dyn NotificationSink>, channel: impl Into<String>) -> Self {
    Self {
      sink,
      channel: channel.into(),
    }
  }

  /// Destination channel identifier.
  pub fn channel(&self) -> &str {
    &self.channel
  }

  /// Format `sample` and send it once. Returns the text that was sent.
  #[instrument(skip(self, sample), fields(channel = %self.channel))]
  pub async fn publish(&self, sample: &PriceSample) -> Result<String, PublishError> {
    let text = format(sample);
    self
      .sink
      .send(&self.channel, &text, RenderMode::Html)
      .await?;
    info!(message = %text, "Price delivered");
    Ok(text)
  }
}
