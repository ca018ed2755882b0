//! Per-symbol high-water marks that keep polling idempotent across cycles.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::core::NewsItem;

/// Tracks the newest timestamp already emitted for each symbol.
///
/// Each symbol is an independent cursor: updates for one symbol only lock that
/// symbol's map entry, so pollers for different symbols never wait on each other.
/// Cursors never move backwards.
#[derive(Debug, Default)]
pub struct WatermarkTracker {
    cursors: DashMap<String, DateTime<Utc>>,
}

impl WatermarkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last seen timestamp for `symbol`, or the minimum representable instant.
    pub fn get(&self, symbol: &str) -> DateTime<Utc> {
        self.cursors
            .get(symbol)
            .map_or(DateTime::<Utc>::MIN_UTC, |c| *c)
    }

    /// Move the cursor to `max(current, candidate)` and return the new value.
    pub fn advance(&self, symbol: &str, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let mut cursor = self
            .cursors
            .entry(symbol.to_string())
            .or_insert(DateTime::<Utc>::MIN_UTC);
        let previous = *cursor;
        if candidate > previous {
            *cursor = candidate;
            debug!(symbol, from = %previous, to = %candidate, "watermark advanced");
        }
        *cursor
    }

    /// Items strictly newer than the current watermark for `symbol`.
    pub fn filter_new(&self, symbol: &str, items: Vec<NewsItem>) -> Vec<NewsItem> {
        let last = self.get(symbol);
        items.into_iter().filter(|i| i.timestamp > last).collect()
    }

    /// Filter and advance in one step while holding the symbol's entry.
    ///
    /// Two pollers racing on the same symbol cannot both emit the same item.
    pub fn take_new(&self, symbol: &str, items: Vec<NewsItem>) -> Vec<NewsItem> {
        let mut cursor = self
            .cursors
            .entry(symbol.to_string())
            .or_insert(DateTime::<Utc>::MIN_UTC);
        let last = *cursor;
        let fresh: Vec<NewsItem> = items.into_iter().filter(|i| i.timestamp > last).collect();
        if let Some(newest) = fresh.iter().map(|i| i.timestamp).max() {
            *cursor = newest;
            debug!(symbol, fresh = fresh.len(), to = %newest, "watermark advanced");
        }
        fresh
    }

    /// Number of symbols with a cursor.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
