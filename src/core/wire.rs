//! Lenient inbound shapes. Every field is optional so a bad item can be
//! reported precisely instead of failing the whole payload.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    SfError,
    models::{MergedNewsItem, NewsItem, PricePoint, SentimentResult, SentimentScores, label_for_compound},
};

#[derive(Deserialize)]
pub(crate) struct NewsItemWire {
    pub(crate) timestamp: Option<String>,
    #[serde(alias = "stock")]
    pub(crate) symbol: Option<String>,
    #[serde(alias = "newsData")]
    pub(crate) text: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct PricePointWire {
    pub(crate) timestamp: Option<String>,
    #[serde(alias = "stock")]
    pub(crate) symbol: Option<String>,
    pub(crate) price: Option<Decimal>,
}

#[derive(Deserialize)]
pub(crate) struct SentimentWire {
    pub(crate) timestamp: Option<String>,
    #[serde(alias = "stock")]
    pub(crate) symbol: Option<String>,
    #[serde(alias = "sentiment")]
    pub(crate) label: Option<String>,
    #[serde(default)]
    pub(crate) scores: Option<ScoresWire>,
}

#[derive(Deserialize, Default)]
pub(crate) struct ScoresWire {
    #[serde(default)]
    pub(crate) neg: Option<f64>,
    #[serde(default)]
    pub(crate) neu: Option<f64>,
    #[serde(default)]
    pub(crate) pos: Option<f64>,
    #[serde(default)]
    pub(crate) compound: Option<f64>,
}

/// One entry of the scoring request body.
///
/// Carries both `symbol`/`text` and the `stock`/`newsData` keys older scoring
/// services require; each side ignores the keys it does not know.
#[derive(Debug, Serialize)]
pub(crate) struct ScoreRequestWire<'a> {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) symbol: &'a str,
    pub(crate) text: &'a str,
    pub(crate) stock: &'a str,
    #[serde(rename = "newsData")]
    pub(crate) news_data: &'a str,
}

impl<'a> From<&'a MergedNewsItem> for ScoreRequestWire<'a> {
    fn from(m: &'a MergedNewsItem) -> Self {
        Self {
            timestamp: m.timestamp,
            symbol: &m.symbol,
            text: &m.merged_text,
            stock: &m.symbol,
            news_data: &m.merged_text,
        }
    }
}

pub(crate) fn parse_timestamp(raw: Option<&str>, what: &str) -> Result<DateTime<Utc>, SfError> {
    let raw = raw.ok_or_else(|| SfError::Data(format!("{what}: missing timestamp")))?;
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SfError::Data(format!("{what}: bad timestamp '{raw}': {e}")))
}

fn required_symbol(raw: Option<String>, what: &str) -> Result<String, SfError> {
    match raw.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(SfError::Data(format!("{what}: missing symbol"))),
    }
}

impl TryFrom<NewsItemWire> for NewsItem {
    type Error = SfError;

    fn try_from(w: NewsItemWire) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(w.timestamp.as_deref(), "news item")?;
        let symbol = required_symbol(w.symbol, "news item")?;
        let text = w
            .text
            .ok_or_else(|| SfError::Data("news item: missing text".into()))?;
        Ok(NewsItem {
            timestamp,
            symbol,
            text,
        })
    }
}

impl TryFrom<PricePointWire> for PricePoint {
    type Error = SfError;

    fn try_from(w: PricePointWire) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(w.timestamp.as_deref(), "price point")?;
        let symbol = required_symbol(w.symbol, "price point")?;
        let price = w
            .price
            .ok_or_else(|| SfError::Data(format!("price point for {symbol}: missing price")))?;
        Ok(PricePoint {
            timestamp,
            symbol,
            price,
        })
    }
}

impl TryFrom<SentimentWire> for SentimentResult {
    type Error = SfError;

    fn try_from(w: SentimentWire) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(w.timestamp.as_deref(), "sentiment result")?;
        let symbol = required_symbol(w.symbol, "sentiment result")?;
        let raw = w.scores.unwrap_or_default();
        let scores = SentimentScores {
            neg: raw.neg.unwrap_or(0.0),
            neu: raw.neu.unwrap_or(0.0),
            pos: raw.pos.unwrap_or(0.0),
            compound: raw.compound.unwrap_or(0.0),
        };
        let label = match w.label {
            Some(l) if !l.trim().is_empty() => l,
            _ => label_for_compound(scores.compound).to_string(),
        };
        Ok(SentimentResult {
            timestamp,
            symbol,
            label,
            scores,
        })
    }
}

/// Decode one inbound news message (`{timestamp, symbol, text}`).
///
/// # Errors
///
/// Returns `SfError::Json` for invalid JSON and `SfError::Data` when a field is missing or malformed.
pub fn decode_news_item(json: &str) -> Result<NewsItem, SfError> {
    let wire: NewsItemWire = serde_json::from_str(json)?;
    wire.try_into()
}

/// Decode one inbound price message (`{timestamp, symbol, price}`).
///
/// # Errors
///
/// Returns `SfError::Json` for invalid JSON and `SfError::Data` when a field is missing or malformed.
pub fn decode_price_point(json: &str) -> Result<PricePoint, SfError> {
    let wire: PricePointWire = serde_json::from_str(json)?;
    wire.try_into()
}
