use std::time::Duration;

use sentiflow::{Backoff, GatewayClient, MergedNewsItem, RetryConfig, SfError};

use crate::common::{gateway_url, mock_gateway, setup_server, ts};

fn one_item() -> Vec<MergedNewsItem> {
    vec![MergedNewsItem {
        timestamp: ts("2024-05-01T14:00:00Z"),
        symbol: "TSLA".into(),
        merged_text: "Deliveries miss".into(),
    }]
}

#[tokio::test]
async fn failures_are_not_retried_by_default() {
    let server = setup_server();
    let mock = mock_gateway(&server, 503, "busy");

    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .build()
        .unwrap();
    let err = client.score(&one_item()).await.unwrap_err();

    assert!(matches!(err, SfError::Status { status: 503, .. }));
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn opt_in_retry_resends_transient_failures() {
    let server = setup_server();
    let mock = mock_gateway(&server, 503, "busy");

    let retry = RetryConfig {
        max_retries: 2,
        backoff: Backoff::Fixed(Duration::from_millis(10)),
        ..RetryConfig::default()
    };
    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .retry_policy(retry)
        .build()
        .unwrap();
    let err = client.score(&one_item()).await.unwrap_err();

    assert!(matches!(err, SfError::Status { status: 503, .. }));
    assert_eq!(mock.hits(), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = setup_server();
    let mock = mock_gateway(&server, 422, r#"{"detail":"bad payload"}"#);

    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .retry_policy(RetryConfig {
            backoff: Backoff::Fixed(Duration::from_millis(10)),
            ..RetryConfig::default()
        })
        .build()
        .unwrap();
    let err = client.score(&one_item()).await.unwrap_err();

    assert!(matches!(err, SfError::Status { status: 422, .. }));
    assert_eq!(mock.hits(), 1);
}
