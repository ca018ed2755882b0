//! Wires the buffer, dispatcher, sink, store and chart service together.
//!
//! ```text
//! news feed ─► watermark ─► BufferHandle ─► FlushController ─► dispatcher
//!                                                   (merge ─► gateway ─► sink)
//! quote feed ─────────────────────────────────────────────────────────► sink
//! store ─► ChartService (align)
//! ```

mod dispatch;

pub use dispatch::{FlushReport, process_batch};

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tracing::{error, info, warn};
use url::Url;

use crate::{
    buffer::{BufferHandle, FlushController},
    chart::ChartService,
    config::PipelineConfig,
    core::{ResultSink, SentimentScorer, SfError, decode_news_item, decode_price_point},
    feed::PollTargets,
    gateway::GatewayClient,
    sink::{Notification, StoreSink},
    store::{MemoryStore, SeriesStore},
    watermark::WatermarkTracker,
};

/// Assembles a pipeline from a config and optional collaborators.
pub struct PipelineBuilder {
    config: PipelineConfig,
    scorer: Option<Arc<dyn SentimentScorer>>,
    store: Option<Arc<dyn SeriesStore>>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            scorer: None,
            store: None,
        }
    }

    /// Use this scorer instead of a [`GatewayClient`] built from the config.
    #[must_use]
    pub fn scorer(mut self, scorer: Arc<dyn SentimentScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Use this store instead of a fresh [`MemoryStore`].
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SeriesStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Spawn the flush controller, the dispatcher and the retention sweep.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Config` for an invalid config, or the gateway
    /// client's build error when no scorer was supplied.
    pub fn start(self) -> Result<Pipeline, SfError> {
        let config = self.config;
        config.validate()?;

        let scorer: Arc<dyn SentimentScorer> = match self.scorer {
            Some(s) => s,
            None => Arc::new(
                GatewayClient::builder()
                    .endpoint(Url::parse(&config.gateway_url)?)
                    .timeout(config.gateway_timeout)
                    .build()?,
            ),
        };
        let store: Arc<dyn SeriesStore> = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let sink = Arc::new(StoreSink::new(Arc::clone(&store), config.notify_capacity));

        let (batch_tx, batch_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (reports, _) = broadcast::channel(config.notify_capacity.max(1));
        let (controller, buffer) = FlushController::spawn(config.buffer(), batch_tx);
        let dispatcher = tokio::spawn(dispatch::run(
            batch_rx,
            scorer,
            Arc::clone(&sink) as Arc<dyn ResultSink>,
            reports.clone(),
        ));
        let (retention_stop, retention) = spawn_retention(
            Arc::clone(&store),
            config.retention,
            config.retention_sweep_interval,
        );

        info!(
            batch_size = config.batch_size,
            symbols = config.symbols.len(),
            "pipeline started"
        );

        Ok(Pipeline {
            config,
            buffer,
            controller,
            dispatcher,
            retention,
            retention_stop,
            sink,
            store,
            reports,
            watermarks: Arc::new(WatermarkTracker::new()),
        })
    }
}

/// A running pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    buffer: BufferHandle,
    controller: FlushController,
    dispatcher: JoinHandle<()>,
    retention: JoinHandle<()>,
    retention_stop: oneshot::Sender<()>,
    sink: Arc<StoreSink>,
    store: Arc<dyn SeriesStore>,
    reports: broadcast::Sender<FlushReport>,
    watermarks: Arc<WatermarkTracker>,
}

impl Pipeline {
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Producer handle for news items.
    pub fn buffer(&self) -> BufferHandle {
        self.buffer.clone()
    }

    pub fn watermarks(&self) -> Arc<WatermarkTracker> {
        Arc::clone(&self.watermarks)
    }

    /// Everything a [`crate::feed::Poller`] needs to deliver into this pipeline.
    pub fn poll_targets(&self) -> PollTargets {
        PollTargets {
            sink: Arc::clone(&self.sink) as Arc<dyn ResultSink>,
            buffer: self.buffer(),
            watermarks: self.watermarks(),
        }
    }

    /// One notification per persisted price or sentiment.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sink.subscribe()
    }

    /// One report per processed batch.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<FlushReport> {
        self.reports.subscribe()
    }

    pub fn chart(&self) -> ChartService {
        ChartService::new(Arc::clone(&self.store))
    }

    /// Decode an inbound news message and queue it.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Data`/`SfError::Json` for a malformed message (nothing
    /// is queued), or `SfError::Closed` if the pipeline has stopped.
    pub async fn ingest_news_json(&self, json: &str) -> Result<(), SfError> {
        let item = decode_news_item(json).inspect_err(|e| {
            warn!(error = %e, "dropping malformed news message");
        })?;
        self.buffer.append(item).await
    }

    /// Decode an inbound price message and persist it.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Data`/`SfError::Json` for a malformed message, or the
    /// store's error if the write fails.
    pub async fn ingest_price_json(&self, json: &str) -> Result<(), SfError> {
        let point = decode_price_point(json).inspect_err(|e| {
            warn!(error = %e, "dropping malformed price message");
        })?;
        self.sink.record_price(point).await
    }

    /// Purge records older than the retention window, measured from `now`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the delete fails.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<(usize, usize), SfError> {
        purge(self.store.as_ref(), self.config.retention, now)
    }

    /// Flush what is buffered, let the dispatcher finish, and stop all tasks.
    pub async fn stop(self) {
        let Self {
            buffer,
            controller,
            dispatcher,
            retention,
            retention_stop,
            ..
        } = self;
        drop(buffer);
        controller.stop().await;
        if let Err(e) = dispatcher.await {
            error!(error = %e, "dispatcher task failed");
        }
        let _ = retention_stop.send(());
        let _ = retention.await;
        info!("pipeline stopped");
    }
}

fn purge(
    store: &dyn SeriesStore,
    retention: Duration,
    now: DateTime<Utc>,
) -> Result<(usize, usize), SfError> {
    let keep = TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX);
    let cutoff = now
        .checked_sub_signed(keep)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let (prices, sentiments) = store.purge_before(cutoff)?;
    info!(%cutoff, prices, sentiments, "retention sweep done");
    Ok((prices, sentiments))
}

fn spawn_retention(
    store: Arc<dyn SeriesStore>,
    retention: Duration,
    every: Duration,
) -> (oneshot::Sender<()>, JoinHandle<()>) {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        let period = every.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = purge(store.as_ref(), retention, Utc::now()) {
                        error!(error = %e, "retention sweep failed");
                    }
                }
                _ = &mut stop_rx => break,
            }
        }
    });
    (stop_tx, join)
}
