//! Provider Response Schemas - Where Each API Hides Its Price
//!
//! Each exchange wraps its ticker differently and signals failure
//! differently (an in-body status code, or the HTTP status alone). The
//! schema is picked per source in configuration; adding a provider means
//! adding a variant here, nothing in the chain or acquisition changes.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ports::quote_source::SourceUnavailable;

/// Payload layout of one quote source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteSchema {
    /// `{"code":"200000","data":{"price":"2.351",...}}`
    Kucoin,
    /// `{"code":"0","data":[{"last":"2.351",...}]}`
    Okx,
    /// `{"symbol":"TONUSDT","price":"2.35100000"}`
    Binance,
    /// `{"<coin_id>":{"<vs_currency>":2.351}}`
    Coingecko {
        coin_id: String,
        vs_currency: String,
    },
}

#[derive(Debug, Deserialize)]
struct KucoinEnvelope {
    code: String,
    data: Option<KucoinLevel1>,
}

#[derive(Debug, Deserialize)]
struct KucoinLevel1 {
    price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OkxEnvelope {
    code: String,
    #[serde(default)]
    data: Vec<OkxTicker>,
}

#[derive(Debug, Deserialize)]
struct OkxTicker {
    last: String,
}

#[derive(Debug, Deserialize)]
struct BinanceTicker {
    price: String,
}

const KUCOIN_OK: &str = "200000";
const OKX_OK: &str = "0";

impl QuoteSchema {
    /// Extract a strictly positive price from a response body.
    pub fn parse(&self, body: &str) -> Result<Decimal, SourceUnavailable> {
        let raw = match self {
            Self::Kucoin => {
                let envelope: KucoinEnvelope = from_json(body)?;
                if envelope.code != KUCOIN_OK {
                    return Err(SourceUnavailable::Rejected(envelope.code));
                }
                envelope
                    .data
                    .and_then(|d| d.price)
                    .ok_or_else(|| missing("data.price"))?
            }
            Self::Okx => {
                let envelope: OkxEnvelope = from_json(body)?;
                if envelope.code != OKX_OK {
                    return Err(SourceUnavailable::Rejected(envelope.code));
                }
                envelope
                    .data
                    .into_iter()
                    .next()
                    .map(|t| t.last)
                    .ok_or_else(|| missing("data[0].last"))?
            }
            Self::Binance => from_json::<BinanceTicker>(body)?.price,
            Self::Coingecko {
                coin_id,
                vs_currency,
            } => {
                let value: serde_json::Value = from_json(body)?;
                match value.get(coin_id).and_then(|c| c.get(vs_currency)) {
                    Some(serde_json::Value::Number(n)) => n.to_string(),
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => {
                        return Err(SourceUnavailable::Parse(format!(
                            "{coin_id}.{vs_currency} is not numeric: {other}"
                        )));
                    }
                    None => return Err(missing(&format!("{coin_id}.{vs_currency}"))),
                }
            }
        };

        parse_price(&raw)
    }

    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Kucoin => "kucoin",
            Self::Okx => "okx",
            Self::Binance => "binance",
            Self::Coingecko { .. } => "coingecko",
        }
    }
}

fn from_json<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, SourceUnavailable> {
    serde_json::from_str(body).map_err(|e| SourceUnavailable::Parse(e.to_string()))
}

fn missing(field: &str) -> SourceUnavailable {
    SourceUnavailable::Parse(format!("missing field {field}"))
}

/// Parse a decimal price, accepting scientific notation from JSON numbers.
fn parse_price(raw: &str) -> Result<Decimal, SourceUnavailable> {
    let trimmed = raw.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| SourceUnavailable::Parse(format!("not a decimal: {trimmed:?}")))?;

    if value <= Decimal::ZERO {
        return Err(SourceUnavailable::InvalidPrice(trimmed.to_string()));
    }
    Ok(value.normalize())
}
