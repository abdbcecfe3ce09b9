//! Quote Source Adapters - REST Price Providers
//!
//! - `schema`: per-provider payload layouts (KuCoin, OKX, Binance, CoinGecko)
//! - `http_source`: `QuoteSource` implementation over HTTP GET

pub mod http_source;
pub mod schema;

use std::sync::Arc;

use crate::adapters::http::HttpContext;
use crate::config::SourceConfig;
use crate::ports::quote_source::QuoteSource;

pub use http_source::HttpQuoteSource;
pub use schema::QuoteSchema;

/// Build every enabled source from configuration.
pub fn build_sources(
    configs: &[SourceConfig],
    http: &Arc<HttpContext>,
) -> Vec<Arc<dyn QuoteSource>> {
    configs
        .iter()
        .filter(|c| c.enabled)
        .map(|c| Arc::new(HttpQuoteSource::from_config(c, Arc::clone(http))) as Arc<dyn QuoteSource>)
        .collect()
}
