use std::{str::FromStr, time::Duration};

use chrono::Utc;
use httpmock::Method::GET;
use rust_decimal::Decimal;
use sentiflow::{QuoteFeed, RetryConfig, SfError};
use url::Url;

use crate::common::setup_server;

#[tokio::test]
async fn current_price_is_read_from_c() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/quote")
            .query_param("symbol", "AAPL")
            .query_param("token", "t0k3n");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"c":189.87,"d":1.2,"dp":0.64,"h":190.1,"l":187.3,"o":188.0,"pc":188.67,"t":1714579200}"#);
    });

    let feed = QuoteFeed::builder()
        .base(Url::parse(&server.url("/api/v1/")).unwrap())
        .token("t0k3n")
        .build()
        .unwrap();
    let before = Utc::now();
    let point = feed.fetch("AAPL").await.unwrap();

    mock.assert();
    assert_eq!(point.symbol, "AAPL");
    assert_eq!(point.price, Decimal::from_str("189.87").unwrap());
    assert!(point.timestamp >= before);
}

#[tokio::test]
async fn missing_price_is_a_data_error() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/quote");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"d":null,"dp":null}"#);
    });

    let feed = QuoteFeed::builder()
        .base(Url::parse(&server.url("/api/v1/")).unwrap())
        .build()
        .unwrap();
    let err = feed.fetch("ZZZZ").await.unwrap_err();
    assert!(matches!(err, SfError::Data(ref m) if m.contains("ZZZZ")));
}

#[tokio::test]
async fn rate_limited_quote_is_retried() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/quote");
        then.status(429).body("slow down");
    });

    let feed = QuoteFeed::builder()
        .base(Url::parse(&server.url("/api/v1/")).unwrap())
        .retry_policy(RetryConfig {
            max_retries: 1,
            backoff: sentiflow::Backoff::Fixed(Duration::from_millis(5)),
            ..RetryConfig::default()
        })
        .build()
        .unwrap();
    let err = feed.fetch("AAPL").await.unwrap_err();

    assert!(matches!(err, SfError::Status { status: 429, .. }));
    assert_eq!(mock.hits(), 2);
}
