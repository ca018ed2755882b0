//! Persist-then-notify sink at the boundary to storage and push channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::{
    core::{PricePoint, ResultSink, SentimentResult, SfError},
    store::SeriesStore,
};

/// Pushed to subscribers once per persisted item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notification {
    Price {
        timestamp: DateTime<Utc>,
        symbol: String,
        price: Decimal,
    },
    Sentiment {
        timestamp: DateTime<Utc>,
        symbol: String,
        #[serde(rename = "sentiment")]
        label: String,
        compound: f64,
    },
}

impl Notification {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Price { symbol, .. } | Self::Sentiment { symbol, .. } => symbol,
        }
    }
}

/// Writes to a [`SeriesStore`] and broadcasts a [`Notification`] per item.
///
/// A notification is only sent after the write succeeded. Having no
/// subscribers is not an error.
#[derive(Clone)]
pub struct StoreSink {
    store: Arc<dyn SeriesStore>,
    notify: broadcast::Sender<Notification>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn SeriesStore>, capacity: usize) -> Self {
        let (notify, _) = broadcast::channel(capacity.max(1));
        Self { store, notify }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn SeriesStore> {
        &self.store
    }

    fn publish(&self, n: Notification) {
        let receivers = self.notify.send(n).unwrap_or(0);
        trace!(receivers, "notification published");
    }

    /// # Errors
    ///
    /// Returns the store's error; nothing is published in that case.
    pub fn persist_sentiment(&self, result: SentimentResult) -> Result<(), SfError> {
        let n = Notification::Sentiment {
            timestamp: result.timestamp,
            symbol: result.symbol.clone(),
            label: result.label.clone(),
            compound: result.scores.compound,
        };
        self.store.append_sentiment(result)?;
        self.publish(n);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the store's error; nothing is published in that case.
    pub fn persist_price(&self, point: PricePoint) -> Result<(), SfError> {
        let n = Notification::Price {
            timestamp: point.timestamp,
            symbol: point.symbol.clone(),
            price: point.price,
        };
        self.store.append_price(point)?;
        self.publish(n);
        Ok(())
    }
}

impl ResultSink for StoreSink {
    fn record_sentiment(&self, result: SentimentResult) -> BoxFuture<'_, Result<(), SfError>> {
        Box::pin(async move { self.persist_sentiment(result) })
    }

    fn record_price(&self, point: PricePoint) -> BoxFuture<'_, Result<(), SfError>> {
        Box::pin(async move { self.persist_price(point) })
    }
}
