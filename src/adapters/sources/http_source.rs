//! HTTP Quote Source - REST Ticker Polling
//!
//! One unauthenticated GET per fetch, parsed with the source's
//! [`QuoteSchema`]. Uses the shared [`HttpContext`] client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::adapters::http::HttpContext;
use crate::config::SourceConfig;
use crate::domain::price::PriceSample;
use crate::ports::quote_source::{QuoteSource, SourceUnavailable};

use super::schema::QuoteSchema;

/// A quote source reached over HTTP GET.
pub struct HttpQuoteSource {
    name: String,
    priority: u32,
    url: String,
    schema: QuoteSchema,
    http: Arc<HttpContext>,
}

impl HttpQuoteSource {
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        url: impl Into<String>,
        schema: QuoteSchema,
        http: Arc<HttpContext>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            url: url.into(),
            schema,
            http,
        }
    }

    /// Build from a `[[sources]]` config entry.
    pub fn from_config(config: &SourceConfig, http: Arc<HttpContext>) -> Self {
        Self::new(
            config.name.clone(),
            config.priority,
            config.url.clone(),
            config.schema.clone(),
            http,
        )
    }

    /// Endpoint queried by this source.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    #[instrument(skip(self), fields(source = %self.name, schema = self.schema.label()))]
    async fn fetch(&self, timeout: Duration) -> Result<PriceSample, SourceUnavailable> {
        let client = self
            .http
            .client()
            .await
            .map_err(|e| SourceUnavailable::Transport(e.to_string()))?;

        let response = client
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(&e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceUnavailable::BadStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| classify(&e, timeout))?;
        let value = self.schema.parse(&body)?;
        debug!(price = %value, "Parsed quote");

        Ok(PriceSample::new(value, self.name.clone()))
    }
}

fn classify(e: &reqwest::Error, timeout: Duration) -> SourceUnavailable {
    if e.is_timeout() {
        SourceUnavailable::Timeout(timeout)
    } else {
        SourceUnavailable::Transport(e.to_string())
    }
}
