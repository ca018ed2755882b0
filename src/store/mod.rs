//! Persistence boundary for the price and sentiment series.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::core::{PricePoint, SentimentResult, SfError};

/// Storage for both persisted series.
///
/// Range reads return entries strictly after `from`, ascending by timestamp,
/// which is the precondition [`crate::align::align`] relies on.
pub trait SeriesStore: Send + Sync {
    /// # Errors
    /// Returns `SfError::Store` when the write is rejected.
    fn append_price(&self, point: PricePoint) -> Result<(), SfError>;

    /// # Errors
    /// Returns `SfError::Store` when the write is rejected.
    fn append_sentiment(&self, result: SentimentResult) -> Result<(), SfError>;

    /// # Errors
    /// Returns `SfError::Store` when the read fails.
    fn prices_since(&self, symbol: &str, from: DateTime<Utc>) -> Result<Vec<PricePoint>, SfError>;

    /// # Errors
    /// Returns `SfError::Store` when the read fails.
    fn sentiments_since(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
    ) -> Result<Vec<SentimentResult>, SfError>;

    /// Delete everything older than `cutoff`. Returns `(prices, sentiments)` removed.
    ///
    /// # Errors
    /// Returns `SfError::Store` when the delete fails.
    fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<(usize, usize), SfError>;
}

/// In-process store keeping each symbol's series sorted by timestamp.
///
/// Out-of-order inserts land after any existing entry with the same
/// timestamp, so arrival order is kept among ties.
#[derive(Debug, Default)]
pub struct MemoryStore {
    prices: DashMap<String, Vec<PricePoint>>,
    sentiments: DashMap<String, Vec<SentimentResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price_count(&self) -> usize {
        self.prices.iter().map(|e| e.value().len()).sum()
    }

    pub fn sentiment_count(&self) -> usize {
        self.sentiments.iter().map(|e| e.value().len()).sum()
    }
}

fn insert_sorted<T>(series: &mut Vec<T>, value: T, ts: impl Fn(&T) -> DateTime<Utc>) {
    let at = ts(&value);
    let idx = series.partition_point(|e| ts(e) <= at);
    series.insert(idx, value);
}

fn tail_after<T: Clone>(series: &[T], from: DateTime<Utc>, ts: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let idx = series.partition_point(|e| ts(e) <= from);
    series[idx..].to_vec()
}

fn drop_before<T>(series: &mut Vec<T>, cutoff: DateTime<Utc>, ts: impl Fn(&T) -> DateTime<Utc>) -> usize {
    let idx = series.partition_point(|e| ts(e) < cutoff);
    series.drain(..idx);
    idx
}

impl SeriesStore for MemoryStore {
    fn append_price(&self, point: PricePoint) -> Result<(), SfError> {
        let mut series = self.prices.entry(point.symbol.clone()).or_default();
        insert_sorted(series.value_mut(), point, |p| p.timestamp);
        Ok(())
    }

    fn append_sentiment(&self, result: SentimentResult) -> Result<(), SfError> {
        let mut series = self.sentiments.entry(result.symbol.clone()).or_default();
        insert_sorted(series.value_mut(), result, |s| s.timestamp);
        Ok(())
    }

    fn prices_since(&self, symbol: &str, from: DateTime<Utc>) -> Result<Vec<PricePoint>, SfError> {
        Ok(self
            .prices
            .get(symbol)
            .map(|s| tail_after(s.value(), from, |p| p.timestamp))
            .unwrap_or_default())
    }

    fn sentiments_since(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
    ) -> Result<Vec<SentimentResult>, SfError> {
        Ok(self
            .sentiments
            .get(symbol)
            .map(|s| tail_after(s.value(), from, |r| r.timestamp))
            .unwrap_or_default())
    }

    fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<(usize, usize), SfError> {
        let prices: usize = self
            .prices
            .iter_mut()
            .map(|mut e| drop_before(e.value_mut(), cutoff, |p| p.timestamp))
            .sum();
        let sentiments: usize = self
            .sentiments
            .iter_mut()
            .map(|mut e| drop_before(e.value_mut(), cutoff, |s| s.timestamp))
            .sum();
        self.prices.retain(|_, v| !v.is_empty());
        self.sentiments.retain(|_, v| !v.is_empty());
        Ok((prices, sentiments))
    }
}
