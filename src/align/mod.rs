//! Price/sentiment alignment for chart views.
//!
//! Both inputs must already be restricted to the requested window and sorted
//! ascending by timestamp; nothing here sorts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::core::{ChartPoint, PricePoint, SentimentResult};

/// Sentiment entries keyed by timestamp for floor lookups.
///
/// Entries sharing an exact timestamp collapse to the first one seen.
#[derive(Debug, Default)]
pub struct SentimentIndex<'a> {
    by_ts: BTreeMap<DateTime<Utc>, &'a SentimentResult>,
}

impl<'a> SentimentIndex<'a> {
    pub fn build(sentiments: &'a [SentimentResult]) -> Self {
        let mut by_ts = BTreeMap::new();
        for s in sentiments {
            by_ts.entry(s.timestamp).or_insert(s);
        }
        Self { by_ts }
    }

    /// The entry with the greatest timestamp `<= ts`, if any.
    pub fn floor(&self, ts: DateTime<Utc>) -> Option<&'a SentimentResult> {
        self.by_ts.range(..=ts).next_back().map(|(_, s)| *s)
    }

    pub fn len(&self) -> usize {
        self.by_ts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ts.is_empty()
    }
}

/// Merge a price series and a sentiment series into one chart series.
///
/// Each price point carries the label and compound score of the latest
/// sentiment at or before it. With no prices at all, every sentiment entry is
/// emitted on its own with the price unset.
pub fn align(prices: &[PricePoint], sentiments: &[SentimentResult]) -> Vec<ChartPoint> {
    if prices.is_empty() {
        return sentiments
            .iter()
            .map(|s| ChartPoint {
                timestamp: s.timestamp,
                price: None,
                sentiment_label: Some(s.label.clone()),
                compound: Some(s.scores.compound),
            })
            .collect();
    }

    let index = SentimentIndex::build(sentiments);
    prices
        .iter()
        .map(|p| {
            let matched = index.floor(p.timestamp);
            ChartPoint {
                timestamp: p.timestamp,
                price: Some(p.price),
                sentiment_label: matched.map(|s| s.label.clone()),
                compound: matched.map(|s| s.scores.compound),
            }
        })
        .collect()
}
