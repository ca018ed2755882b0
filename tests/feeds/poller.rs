use std::{sync::Arc, time::Duration};

use httpmock::Method::GET;
use sentiflow::{
    FeedKind, NewsFeed, Notification, Pipeline, PipelineConfig, Poller, QuoteFeed, RetryConfig,
};
use url::Url;

use crate::common::{FixedScorer, setup_server, within};

fn config() -> PipelineConfig {
    PipelineConfig {
        batch_size: 100,
        flush_interval: Duration::from_secs(3600),
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn news_poll_only_forwards_unseen_items() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/v2/everything").query_param("q", "AAPL");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"articles":[
              {"title":"one","description":"a","publishedAt":"2024-05-01T14:00:00Z"},
              {"title":"two","description":"b","publishedAt":"2024-05-01T13:00:00Z"}
            ]}"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v2/everything").query_param("q", "MSFT");
        then.status(500).body("down");
    });

    let pipeline = Pipeline::builder(config())
        .scorer(Arc::new(FixedScorer::default()))
        .start()
        .unwrap();
    let targets = pipeline.poll_targets();

    let feed = NewsFeed::builder()
        .base(Url::parse(&server.url("/v2/")).unwrap())
        .retry_policy(RetryConfig::disabled())
        .build()
        .unwrap();
    let poller = Poller::new(feed, ["AAPL", "MSFT"]);
    assert_eq!(poller.kind(), FeedKind::News);

    assert_eq!(poller.poll_once(&targets).await, 2, "MSFT failure is isolated");
    assert_eq!(poller.poll_once(&targets).await, 0, "same articles are filtered");
    assert_eq!(
        pipeline.watermarks().get("AAPL").to_rfc3339(),
        "2024-05-01T14:00:00+00:00"
    );
    assert_eq!(pipeline.buffer().flush().await.unwrap(), 2);

    drop(targets);
    pipeline.stop().await;
}

#[tokio::test]
async fn quote_poll_records_prices_directly() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/quote");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"c":412.5}"#);
    });

    let pipeline = Pipeline::builder(config())
        .scorer(Arc::new(FixedScorer::default()))
        .start()
        .unwrap();
    let mut notifications = pipeline.subscribe();

    let feed = QuoteFeed::builder()
        .base(Url::parse(&server.url("/api/v1/")).unwrap())
        .build()
        .unwrap();
    let poller = Poller::new(feed, ["MSFT"]);
    assert_eq!(poller.poll_once(&pipeline.poll_targets()).await, 1);

    match within(notifications.recv()).await.unwrap() {
        Notification::Price { symbol, price, .. } => {
            assert_eq!(symbol, "MSFT");
            assert_eq!(price.to_string(), "412.5");
        }
        other => panic!("expected a price notification, got {other:?}"),
    }
    assert_eq!(pipeline.chart().live("MSFT").unwrap().len(), 1);

    pipeline.stop().await;
}

#[tokio::test]
async fn poller_without_symbols_is_rejected() {
    let pipeline = Pipeline::builder(config())
        .scorer(Arc::new(FixedScorer::default()))
        .start()
        .unwrap();
    let feed = NewsFeed::builder().build().unwrap();
    let err = Poller::new(feed, Vec::<String>::new())
        .start(pipeline.poll_targets())
        .err()
        .unwrap();
    assert!(matches!(err, sentiflow::SfError::Config(_)));
    pipeline.stop().await;
}

#[tokio::test]
async fn started_poller_runs_immediately_and_stops() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v2/everything");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"articles":[{"title":"x","description":"y","publishedAt":"2024-05-01T14:00:00Z"}]}"#);
    });

    let pipeline = Pipeline::builder(config())
        .scorer(Arc::new(FixedScorer::default()))
        .start()
        .unwrap();
    let feed = NewsFeed::builder()
        .base(Url::parse(&server.url("/v2/")).unwrap())
        .build()
        .unwrap();
    let handle = Poller::new(feed, ["NVDA"])
        .interval(Duration::from_secs(3600))
        .start(pipeline.poll_targets())
        .unwrap();
    assert_eq!(handle.kind(), FeedKind::News);

    within(async {
        while mock.hits() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    handle.stop().await;
    pipeline.stop().await;
}

#[tokio::test]
async fn news_polled_after_shutdown_is_not_redelivered() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/v2/everything");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"articles":[{"title":"late","description":"news","publishedAt":"2024-05-01T14:00:00Z"}]}"#);
    });

    let pipeline = Pipeline::builder(config())
        .scorer(Arc::new(FixedScorer::default()))
        .start()
        .unwrap();
    let targets = pipeline.poll_targets();
    pipeline.stop().await;

    let feed = NewsFeed::builder()
        .base(Url::parse(&server.url("/v2/")).unwrap())
        .build()
        .unwrap();
    let poller = Poller::new(feed, ["AAPL"]);
    assert_eq!(poller.poll_once(&targets).await, 0);
    assert!(targets.buffer.is_closed());
    assert_eq!(
        targets.watermarks.get("AAPL").to_rfc3339(),
        "2024-05-01T14:00:00+00:00",
        "the cursor moved past items that never reached the buffer"
    );
    assert_eq!(poller.poll_once(&targets).await, 0);
}
