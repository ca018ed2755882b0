use futures::future::BoxFuture;

use crate::core::{
    SfError,
    models::{MergedNewsItem, PricePoint, SentimentResult},
};

/// A service that turns merged news text into sentiment scores.
///
/// Implemented by [`crate::GatewayClient`].
pub trait SentimentScorer: Send + Sync {
    /// Score a whole batch in one call. The batch is all-or-nothing: an `Err`
    /// means none of its items were scored.
    fn score<'a>(
        &'a self,
        batch: &'a [MergedNewsItem],
    ) -> BoxFuture<'a, Result<Vec<SentimentResult>, SfError>>;
}

/// Where scored results and price ticks end up (persistence + notification).
///
/// Called once per item, so a failure is visible at item granularity.
pub trait ResultSink: Send + Sync {
    /// Persist one sentiment result and announce it.
    fn record_sentiment(&self, result: SentimentResult) -> BoxFuture<'_, Result<(), SfError>>;

    /// Persist one price tick and announce it.
    fn record_price(&self, point: PricePoint) -> BoxFuture<'_, Result<(), SfError>>;
}
