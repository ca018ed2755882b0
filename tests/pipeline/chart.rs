use std::{sync::Arc, time::Duration};

use chrono::{TimeDelta, Utc};
use sentiflow::{
    ChartRange, MemoryStore, Pipeline, PipelineConfig, SentimentResult, SentimentScores,
    SeriesStore, SfError,
};

use crate::common::{FixedScorer, minutes_ago};

fn sentiment(at: chrono::DateTime<Utc>, symbol: &str, label: &str, compound: f64) -> SentimentResult {
    SentimentResult {
        timestamp: at,
        symbol: symbol.into(),
        label: label.into(),
        scores: SentimentScores {
            compound,
            ..SentimentScores::default()
        },
    }
}

fn price_json(at: chrono::DateTime<Utc>, symbol: &str, price: &str) -> String {
    format!(
        r#"{{"timestamp":"{}","symbol":"{symbol}","price":{price}}}"#,
        at.to_rfc3339()
    )
}

fn start(store: Arc<MemoryStore>) -> Pipeline {
    Pipeline::builder(PipelineConfig {
        flush_interval: Duration::from_secs(3600),
        ..PipelineConfig::default()
    })
    .scorer(Arc::new(FixedScorer::default()))
    .store(store)
    .start()
    .unwrap()
}

#[tokio::test]
async fn prices_carry_latest_sentiment_at_or_before_them() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store
        .append_sentiment(sentiment(minutes_ago(now, 50), "AAPL", "positive", 0.6))
        .unwrap();
    store
        .append_sentiment(sentiment(minutes_ago(now, 20), "AAPL", "negative", -0.3))
        .unwrap();
    let pipeline = start(store);

    for (m, p) in [(55, "187.10"), (40, "188.00"), (20, "188.50"), (10, "186.90")] {
        pipeline
            .ingest_price_json(&price_json(minutes_ago(now, m), "AAPL", p))
            .await
            .unwrap();
    }

    let points = pipeline.chart().trend("AAPL", Some("1d")).unwrap();
    let labels: Vec<Option<&str>> = points.iter().map(|p| p.sentiment_label.as_deref()).collect();
    assert_eq!(
        labels,
        vec![None, Some("positive"), Some("negative"), Some("negative")]
    );
    assert_eq!(points[1].compound, Some(0.6));
    assert!(points.iter().all(|p| p.price.is_some()));
    assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    pipeline.stop().await;
}

#[tokio::test]
async fn range_token_selects_the_window() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    let pipeline = start(Arc::clone(&store));

    for (age, p) in [
        (TimeDelta::days(20), "100"),
        (TimeDelta::days(3), "110"),
        (TimeDelta::hours(2), "120"),
        (TimeDelta::minutes(5), "130"),
    ] {
        pipeline
            .ingest_price_json(&price_json(now - age, "TSLA", p))
            .await
            .unwrap();
    }

    let chart = pipeline.chart();
    assert_eq!(chart.trend("TSLA", Some("1m")).unwrap().len(), 4);
    assert_eq!(chart.trend("TSLA", None).unwrap().len(), 3, "defaults to 7d");
    assert_eq!(chart.trend("TSLA", Some("7d")).unwrap().len(), 3);
    assert_eq!(chart.trend("TSLA", Some("1d")).unwrap().len(), 2);
    assert_eq!(chart.live("TSLA").unwrap().len(), 1);
    assert!(chart.trend("MSFT", Some("1d")).unwrap().is_empty());

    pipeline.stop().await;
}

#[tokio::test]
async fn unknown_range_is_rejected() {
    let pipeline = start(Arc::new(MemoryStore::new()));
    let err = pipeline.chart().trend("AAPL", Some("2w")).unwrap_err();
    assert!(matches!(err, SfError::UnsupportedRange(ref t) if t == "2w"));
    assert_eq!(ChartRange::parse(Some("1m")).unwrap(), ChartRange::Month);
    pipeline.stop().await;
}

#[tokio::test]
async fn sentiment_only_symbol_falls_back_to_sentiment_points() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store
        .append_sentiment(sentiment(minutes_ago(now, 30), "AMZN", "neutral", 0.01))
        .unwrap();
    store
        .append_sentiment(sentiment(minutes_ago(now, 15), "AMZN", "positive", 0.4))
        .unwrap();
    let pipeline = start(store);

    let points = pipeline.chart().live("AMZN").unwrap();
    assert_eq!(points.len(), 2);
    assert!(points.iter().all(|p| p.price.is_none()));
    assert_eq!(points[1].sentiment_label.as_deref(), Some("positive"));

    pipeline.stop().await;
}

#[tokio::test]
async fn retention_purges_old_records() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store
        .append_sentiment(sentiment(now - TimeDelta::days(45), "GOOGL", "neutral", 0.0))
        .unwrap();
    let pipeline = start(Arc::clone(&store));
    pipeline
        .ingest_price_json(&price_json(now - TimeDelta::days(31), "GOOGL", "150"))
        .await
        .unwrap();
    pipeline
        .ingest_price_json(&price_json(now - TimeDelta::days(1), "GOOGL", "160"))
        .await
        .unwrap();

    assert_eq!(pipeline.purge_expired(now).unwrap(), (1, 1));
    assert_eq!(store.price_count(), 1);
    assert_eq!(store.sentiment_count(), 0);

    pipeline.stop().await;
}
