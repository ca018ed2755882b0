use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use crate::{
    buffer::{Batch, FlushTrigger},
    core::{ResultSink, SentimentScorer},
    merge::merge_news,
};

/// Outcome of processing one detached batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub seq: u64,
    pub trigger: FlushTrigger,
    /// Raw items in the batch.
    pub received: usize,
    /// Items after merging equal `(symbol, timestamp)` keys.
    pub merged: usize,
    /// Results the gateway returned.
    pub scored: usize,
    /// Results written to the sink.
    pub persisted: usize,
    /// Results the sink rejected.
    pub failed: usize,
    /// Set when the whole batch was dropped.
    pub error: Option<String>,
}

impl FlushReport {
    pub fn dropped(&self) -> bool {
        self.error.is_some()
    }
}

/// Merge, score and sink one batch.
///
/// A scoring failure drops the whole batch; a sink failure only affects its item.
pub async fn process_batch(
    batch: Batch,
    scorer: &dyn SentimentScorer,
    sink: &dyn ResultSink,
) -> FlushReport {
    let received = batch.items.len();
    let merged = merge_news(batch.items);
    let mut report = FlushReport {
        seq: batch.seq,
        trigger: batch.trigger,
        received,
        merged: merged.len(),
        scored: 0,
        persisted: 0,
        failed: 0,
        error: None,
    };

    let results = match scorer.score(&merged).await {
        Ok(results) => results,
        Err(e) => {
            error!(
                seq = batch.seq,
                trigger = batch.trigger.as_str(),
                items = merged.len(),
                error = %e,
                "enrichment failed; batch dropped"
            );
            report.error = Some(e.to_string());
            return report;
        }
    };
    report.scored = results.len();

    for result in results {
        let symbol = result.symbol.clone();
        match sink.record_sentiment(result).await {
            Ok(()) => report.persisted += 1,
            Err(e) => {
                report.failed += 1;
                error!(seq = batch.seq, symbol = %symbol, error = %e, "sentiment not persisted");
            }
        }
    }

    if report.scored < report.merged {
        warn!(
            seq = batch.seq,
            merged = report.merged,
            scored = report.scored,
            "gateway returned fewer results than items sent"
        );
    }
    info!(
        seq = report.seq,
        trigger = report.trigger.as_str(),
        received = report.received,
        merged = report.merged,
        persisted = report.persisted,
        failed = report.failed,
        "batch processed"
    );
    report
}

/// Consume batches one at a time until the controller goes away.
pub(crate) async fn run(
    mut batches: mpsc::Receiver<Batch>,
    scorer: Arc<dyn SentimentScorer>,
    sink: Arc<dyn ResultSink>,
    reports: broadcast::Sender<FlushReport>,
) {
    while let Some(batch) = batches.recv().await {
        let report = process_batch(batch, scorer.as_ref(), sink.as_ref()).await;
        let _ = reports.send(report);
    }
}
