use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/* ----- NEWS (shared by feed/, watermark/, merge/, buffer/) ----- */

/// A single raw news item for one symbol, as produced by a news feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub text: String,
}

impl NewsItem {
    pub fn new(timestamp: DateTime<Utc>, symbol: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            text: text.into(),
        }
    }
}

/// All news text for one `(symbol, timestamp)` key within a flush window.
///
/// Serialized with the same shape as [`NewsItem`]. The gateway request body
/// additionally carries `stock`/`newsData` (see `core::wire::ScoreRequestWire`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedNewsItem {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    #[serde(rename = "text")]
    pub merged_text: String,
}

/* ----- SENTIMENT (shared by gateway/, sink/, store/, align/) ----- */

/// Polarity scores returned by the scoring gateway. Absent keys are `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SentimentScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub label: String,
    pub scores: SentimentScores,
}

/// Compound score at or above which text is labelled positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
/// Compound score at or below which text is labelled negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Label for a compound score when the gateway did not provide one.
pub fn label_for_compound(compound: f64) -> &'static str {
    if compound >= POSITIVE_THRESHOLD {
        "positive"
    } else if compound <= NEGATIVE_THRESHOLD {
        "negative"
    } else {
        "neutral"
    }
}

/* ----- PRICES ----- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub price: Decimal,
}

/* ----- CHART (output only) ----- */

/// One unit of the aligned chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub price: Option<Decimal>,
    #[serde(rename = "sentiment")]
    pub sentiment_label: Option<String>,
    pub compound: Option<f64>,
}
