use std::time::Duration;

use httpmock::Method::POST;
use serde_json::json;
use sentiflow::{GatewayClient, MergedNewsItem, SfError};

use crate::common::{gateway_url, mock_gateway, setup_server, ts};

fn merged(symbol: &str, at: &str, text: &str) -> MergedNewsItem {
    MergedNewsItem {
        timestamp: ts(at),
        symbol: symbol.into(),
        merged_text: text.into(),
    }
}

#[tokio::test]
async fn posts_batch_and_parses_results() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/analyze-sentiment")
            .json_body(json!([
                {"timestamp": "2024-05-01T14:00:00Z", "symbol": "AAPL", "text": "Apple beats. Record iPhone sales",
                 "stock": "AAPL", "newsData": "Apple beats. Record iPhone sales"}
            ]));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[
              {"timestamp":"2024-05-01T14:00:00Z","symbol":"AAPL","label":"positive",
               "scores":{"neg":0.0,"neu":0.42,"pos":0.58,"compound":0.81}}
            ]"#);
    });

    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .build()
        .unwrap();
    let results = client
        .score(&[merged(
            "AAPL",
            "2024-05-01T14:00:00Z",
            "Apple beats. Record iPhone sales",
        )])
        .await
        .unwrap();

    mock.assert();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].symbol, "AAPL");
    assert_eq!(results[0].label, "positive");
    assert_eq!(results[0].scores.compound, 0.81);
    assert_eq!(results[0].scores.neu, 0.42);
}

#[tokio::test]
async fn missing_scores_default_to_zero_and_bad_entries_are_skipped() {
    let server = setup_server();
    let mock = mock_gateway(
        &server,
        200,
        r#"[
          {"timestamp":"2024-05-01T14:00:00Z","symbol":"AAPL","label":"neutral","scores":{"compound":0.01}},
          {"timestamp":"not a time","symbol":"AAPL","label":"negative"},
          {"timestamp":"2024-05-01T15:00:00Z","stock":"MSFT","sentiment":"negative"}
        ]"#,
    );

    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .build()
        .unwrap();
    let results = client
        .score(&[
            merged("AAPL", "2024-05-01T14:00:00Z", "a"),
            merged("MSFT", "2024-05-01T15:00:00Z", "b"),
        ])
        .await
        .unwrap();

    mock.assert();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].scores.pos, 0.0);
    assert_eq!(results[0].scores.neg, 0.0);
    assert_eq!(results[0].scores.compound, 0.01);
    assert_eq!(results[1].symbol, "MSFT");
    assert_eq!(results[1].label, "negative");
    assert_eq!(results[1].scores.compound, 0.0);
}

#[tokio::test]
async fn empty_batch_sends_nothing() {
    let server = setup_server();
    let mock = mock_gateway(&server, 200, "[]");

    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .build()
        .unwrap();
    let results = client.score(&[]).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = setup_server();
    let mock = mock_gateway(&server, 500, r#"{"detail":"model not loaded"}"#);

    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .build()
        .unwrap();
    let err = client
        .score(&[merged("AAPL", "2024-05-01T14:00:00Z", "x")])
        .await
        .unwrap_err();

    mock.assert();
    match err {
        SfError::Status { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Status, got {other:?}"),
    }
    assert!(SfError::Status { status: 500, url: String::new() }.is_transport());
}

#[tokio::test]
async fn slow_gateway_times_out() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(POST).path("/analyze-sentiment");
        then.status(200)
            .delay(Duration::from_millis(800))
            .body("[]");
    });

    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    assert_eq!(client.timeout(), Duration::from_millis(100));

    let err = client
        .score(&[merged("AAPL", "2024-05-01T14:00:00Z", "x")])
        .await
        .unwrap_err();
    assert!(matches!(err, SfError::Timeout(d) if d == Duration::from_millis(100)));
}

#[tokio::test]
async fn non_array_body_is_a_json_error() {
    let server = setup_server();
    mock_gateway(&server, 200, r#"{"results":[]}"#);

    let client = GatewayClient::builder()
        .endpoint(gateway_url(&server))
        .build()
        .unwrap();
    let err = client
        .score(&[merged("AAPL", "2024-05-01T14:00:00Z", "x")])
        .await
        .unwrap_err();
    assert!(matches!(err, SfError::Json(_)));
}
