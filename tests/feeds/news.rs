use httpmock::Method::GET;
use sentiflow::NewsFeed;
use url::Url;

use crate::common::{setup_server, ts};

const ARTICLES: &str = r#"{
  "status": "ok",
  "totalResults": 4,
  "articles": [
    {"title":"Apple beats estimates","description":"Record iPhone sales","publishedAt":"2024-05-01T14:00:00Z"},
    {"title":"Apple supplier update","description":null,"publishedAt":"2024-05-01T13:00:00Z"},
    {"title":"Undated","description":"no time","publishedAt":null},
    {"title":"","description":"","publishedAt":"2024-05-01T12:00:00Z"}
  ]
}"#;

#[tokio::test]
async fn articles_become_news_items() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/everything")
            .query_param("q", "AAPL")
            .query_param("pageSize", "5")
            .query_param("sortBy", "publishedAt")
            .query_param("apiKey", "k3y");
        then.status(200)
            .header("content-type", "application/json")
            .body(ARTICLES);
    });

    let feed = NewsFeed::builder()
        .base(Url::parse(&server.url("/v2/")).unwrap())
        .api_key("k3y")
        .build()
        .unwrap();
    let items = feed.fetch("AAPL").await.unwrap();

    mock.assert();
    assert_eq!(items.len(), 2, "undated and empty articles are skipped");
    assert_eq!(items[0].symbol, "AAPL");
    assert_eq!(items[0].text, "Apple beats estimates Record iPhone sales");
    assert_eq!(items[0].timestamp, ts("2024-05-01T14:00:00Z"));
    assert_eq!(items[1].text, "Apple supplier update");
}

#[tokio::test]
async fn page_size_is_configurable_and_missing_articles_is_empty() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/everything")
            .query_param("pageSize", "20");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status":"ok","totalResults":0}"#);
    });

    let feed = NewsFeed::builder()
        .base(Url::parse(&server.url("/v2/")).unwrap())
        .page_size(20)
        .build()
        .unwrap();
    let items = feed.fetch("TSLA").await.unwrap();

    mock.assert();
    assert!(items.is_empty());
}
