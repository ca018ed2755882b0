//! Runs the ingestion pipeline against the configured feeds until Ctrl-C.
//!
//! Reads `SENTIFLOW_*` variables (see `PipelineConfig::from_env`) plus
//! `SENTIFLOW_QUOTE_TOKEN` and `SENTIFLOW_NEWS_API_KEY`. A feed whose
//! credential is unset is not started.

use sentiflow::{NewsFeed, Pipeline, PipelineConfig, Poller, QuoteFeed, SfError};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SfError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from_env()?;
    let pipeline = Pipeline::builder(config.clone()).start()?;
    let targets = pipeline.poll_targets();

    let mut pollers = Vec::new();
    if let Ok(token) = std::env::var("SENTIFLOW_QUOTE_TOKEN") {
        let feed = QuoteFeed::builder().token(token).build()?;
        let poller = Poller::new(feed, config.symbols.clone())
            .interval(config.quote_poll_interval)
            .market_hours_only(config.market_hours_only);
        pollers.push(poller.start(targets.clone())?);
    } else {
        tracing::warn!("SENTIFLOW_QUOTE_TOKEN not set; quote feed disabled");
    }
    if let Ok(key) = std::env::var("SENTIFLOW_NEWS_API_KEY") {
        let feed = NewsFeed::builder().api_key(key).build()?;
        let poller = Poller::new(feed, config.symbols.clone()).interval(config.news_poll_interval);
        pollers.push(poller.start(targets.clone())?);
    } else {
        tracing::warn!("SENTIFLOW_NEWS_API_KEY not set; news feed disabled");
    }
    drop(targets);

    let mut notifications = pipeline.subscribe();
    let mut reports = pipeline.subscribe_reports();
    loop {
        tokio::select! {
            n = notifications.recv() => match n {
                Ok(n) => match serde_json::to_string(&n) {
                    Ok(line) => tracing::info!(symbol = n.symbol(), "{line}"),
                    Err(e) => tracing::warn!(error = %e, "notification not encodable"),
                },
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "notifications lagged"),
                Err(RecvError::Closed) => break,
            },
            r = reports.recv() => {
                if let Ok(report) = r && report.dropped() {
                    tracing::warn!(seq = report.seq, error = ?report.error, "batch dropped");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    for poller in pollers {
        poller.stop().await;
    }
    pipeline.stop().await;
    Ok(())
}
