use std::time::Instant;

use tracing::{debug, warn};

use super::GatewayClient;
use crate::core::{
    MergedNewsItem, SentimentResult, SfError,
    client::{ensure_success, send_with_retry},
    wire::{ScoreRequestWire, SentimentWire},
};

pub(super) async fn score_batch(
    client: &GatewayClient,
    batch: &[MergedNewsItem],
) -> Result<Vec<SentimentResult>, SfError> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let started = Instant::now();
    let payload: Vec<ScoreRequestWire<'_>> = batch.iter().map(ScoreRequestWire::from).collect();
    let req = client
        .http
        .post(client.endpoint.clone())
        .header("accept", "application/json")
        .json(&payload);

    let resp = tokio::time::timeout(client.timeout, send_with_retry(req, &client.retry))
        .await
        .map_err(|_| SfError::Timeout(client.timeout))?
        .map_err(|e| match e {
            SfError::Http(ref inner) if inner.is_timeout() => SfError::Timeout(client.timeout),
            other => other,
        })?;
    let resp = ensure_success(resp)?;
    let body = resp.text().await?;

    let entries: Vec<serde_json::Value> = serde_json::from_str(&body)?;
    let received = entries.len();
    let results: Vec<SentimentResult> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            match serde_json::from_value::<SentimentWire>(raw)
                .map_err(SfError::from)
                .and_then(SentimentResult::try_from)
            {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(index = idx, error = %e, "skipping malformed sentiment result");
                    None
                }
            }
        })
        .collect();

    debug!(
        sent = batch.len(),
        received,
        scored = results.len(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "gateway scored batch"
    );
    Ok(results)
}
