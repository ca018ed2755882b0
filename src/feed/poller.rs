use std::{sync::Arc, time::Duration};

use chrono::Utc;
use futures::future::join_all;
use tokio::{select, sync::oneshot, task::JoinHandle, time::interval};
use tracing::{debug, error, info, warn};

use super::{Feed, FeedKind, is_us_market_open};
use crate::{
    buffer::BufferHandle,
    core::{ResultSink, SfError},
    watermark::WatermarkTracker,
};

/// Where polled data is delivered.
#[derive(Clone)]
pub struct PollTargets {
    /// Receives every price tick.
    pub sink: Arc<dyn ResultSink>,
    /// Receives news items that passed the watermark filter.
    pub buffer: BufferHandle,
    pub watermarks: Arc<WatermarkTracker>,
}

/// Polls one feed for a set of symbols on a fixed cadence.
pub struct Poller {
    feed: Feed,
    symbols: Vec<String>,
    interval: Duration,
    market_hours_only: bool,
}

impl Poller {
    /// Quotes default to every 10 minutes during market hours, news to every 30 minutes.
    pub fn new<I, S>(feed: impl Into<Feed>, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let feed = feed.into();
        let interval = match feed.kind() {
            FeedKind::Quotes => Duration::from_secs(10 * 60),
            FeedKind::News => Duration::from_secs(30 * 60),
        };
        Self {
            market_hours_only: feed.kind() == FeedKind::Quotes,
            feed,
            symbols: symbols.into_iter().map(Into::into).collect(),
            interval,
        }
    }

    /// Poll cadence.
    #[must_use]
    pub fn interval(mut self, dur: Duration) -> Self {
        self.interval = dur;
        self
    }

    /// Skip quote polls outside the regular US session. Ignored for news.
    #[must_use]
    pub fn market_hours_only(mut self, yes: bool) -> Self {
        self.market_hours_only = yes;
        self
    }

    pub fn kind(&self) -> FeedKind {
        self.feed.kind()
    }

    /// Run one cycle over every symbol. Returns how many items were delivered.
    ///
    /// Symbols are fetched concurrently; a failure for one symbol is logged
    /// and does not affect the others.
    ///
    /// News cursors advance before items reach the buffer. If the buffer has
    /// already closed, the unsent items of that cycle are lost and will not be
    /// fetched again.
    pub async fn poll_once(&self, targets: &PollTargets) -> usize {
        match &self.feed {
            Feed::Quotes(feed) => {
                let results = join_all(self.symbols.iter().map(|s| feed.fetch(s))).await;
                let mut delivered = 0;
                for (symbol, res) in self.symbols.iter().zip(results) {
                    match res {
                        Ok(point) => match targets.sink.record_price(point).await {
                            Ok(()) => delivered += 1,
                            Err(e) => error!(symbol = %symbol, error = %e, "price not persisted"),
                        },
                        Err(e) => warn!(symbol = %symbol, error = %e, "quote fetch failed"),
                    }
                }
                delivered
            }
            Feed::News(feed) => {
                let results = join_all(self.symbols.iter().map(|s| feed.fetch(s))).await;
                let mut delivered = 0;
                for (symbol, res) in self.symbols.iter().zip(results) {
                    let items = match res {
                        Ok(items) => items,
                        Err(e) => {
                            warn!(symbol = %symbol, error = %e, "news fetch failed");
                            continue;
                        }
                    };
                    let fetched = items.len();
                    let fresh = targets.watermarks.take_new(symbol, items);
                    debug!(symbol = %symbol, fetched, fresh = fresh.len(), "news polled");
                    for item in fresh {
                        if let Err(e) = targets.buffer.append(item).await {
                            error!(error = %e, "buffer closed; abandoning news poll");
                            return delivered;
                        }
                        delivered += 1;
                    }
                }
                delivered
            }
        }
    }

    /// Start polling in the background. The first cycle runs immediately.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Config` if no symbols were given.
    pub fn start(self, targets: PollTargets) -> Result<PollerHandle, SfError> {
        if self.symbols.is_empty() {
            return Err(SfError::Config(format!(
                "{} poller: at least one symbol required",
                self.kind().as_str()
            )));
        }

        let kind = self.kind();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        info!(
            feed = kind.as_str(),
            symbols = self.symbols.len(),
            interval_secs = self.interval.as_secs(),
            "poller started"
        );

        let join = tokio::spawn(async move {
            let mut ticker = interval(self.interval.max(Duration::from_millis(1)));
            loop {
                select! {
                    _ = ticker.tick() => {
                        let gated = kind == FeedKind::Quotes
                            && self.market_hours_only
                            && !is_us_market_open(Utc::now());
                        if gated {
                            debug!(feed = kind.as_str(), "market closed; poll skipped");
                        } else {
                            let delivered = self.poll_once(&targets).await;
                            debug!(feed = kind.as_str(), delivered, "poll cycle done");
                        }
                        if targets.buffer.is_closed() {
                            break;
                        }
                    }
                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }
        });

        Ok(PollerHandle {
            kind,
            join,
            stop_tx: Some(stop_tx),
        })
    }
}

/// A handle for a running poller task.
pub struct PollerHandle {
    kind: FeedKind,
    join: JoinHandle<()>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl PollerHandle {
    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    /// Politely ask the poller to stop and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.join).await;
    }

    /// Immediately abort the background task.
    pub fn abort(self) {
        self.join.abort();
    }
}
