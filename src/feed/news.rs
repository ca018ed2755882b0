use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::core::{
    NewsItem, RetryConfig, SfError,
    client::{HttpOptions, constants::DEFAULT_BASE_NEWS, ensure_success, send_with_retry},
    wire::parse_timestamp,
};

#[derive(Deserialize)]
struct NewsEnvelope {
    articles: Option<Vec<ArticleWire>>,
}

#[derive(Deserialize)]
struct ArticleWire {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

/// Polls recent articles mentioning a symbol.
#[derive(Debug, Clone)]
pub struct NewsFeed {
    http: reqwest::Client,
    base: Url,
    api_key: Option<String>,
    page_size: u32,
    retry: RetryConfig,
}

impl NewsFeed {
    /// Create a new builder.
    pub fn builder() -> NewsFeedBuilder {
        NewsFeedBuilder::default()
    }

    /// Fetch the newest articles for `symbol`, one [`NewsItem`] per article.
    ///
    /// The item text is the title and description joined by a space. Articles
    /// without a usable timestamp or text are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a transport/status error if the request fails, or `SfError::Json`
    /// if the envelope cannot be parsed.
    #[tracing::instrument(skip(self), err)]
    pub async fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, SfError> {
        let mut url = self.base.join("everything")?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("q", symbol);
            qp.append_pair("pageSize", &self.page_size.to_string());
            qp.append_pair("sortBy", "publishedAt");
            if let Some(key) = &self.api_key {
                qp.append_pair("apiKey", key);
            }
        }

        let req = self.http.get(url).header("accept", "application/json");
        let resp = ensure_success(send_with_retry(req, &self.retry).await?)?;
        let body = resp.text().await?;
        let envelope: NewsEnvelope = serde_json::from_str(&body)?;

        let items = envelope
            .articles
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| {
                let timestamp = match parse_timestamp(a.published_at.as_deref(), "article") {
                    Ok(ts) => ts,
                    Err(e) => {
                        warn!(symbol, error = %e, "skipping article");
                        return None;
                    }
                };
                let title = a.title.unwrap_or_default();
                let description = a.description.unwrap_or_default();
                let text = format!("{title} {description}").trim().to_string();
                if text.is_empty() {
                    warn!(symbol, %timestamp, "skipping article without text");
                    return None;
                }
                Some(NewsItem {
                    timestamp,
                    symbol: symbol.to_string(),
                    text,
                })
            })
            .collect();

        Ok(items)
    }
}

/* ----------------------- Builder ----------------------- */

pub struct NewsFeedBuilder {
    base: Option<Url>,
    api_key: Option<String>,
    page_size: u32,
    http: HttpOptions,
    retry: Option<RetryConfig>,
}

impl Default for NewsFeedBuilder {
    fn default() -> Self {
        Self {
            base: None,
            api_key: None,
            page_size: 5,
            http: HttpOptions::default(),
            retry: None,
        }
    }
}

impl NewsFeedBuilder {
    /// Override the API base (e.g., `https://newsapi.org/v2/`). `everything` is appended.
    #[must_use]
    pub fn base(mut self, url: Url) -> Self {
        self.base = Some(url);
        self
    }

    /// API key sent as the `apiKey` query parameter.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Articles requested per symbol and poll. Default: 5.
    #[must_use]
    pub const fn page_size(mut self, n: u32) -> Self {
        self.page_size = n;
        self
    }

    /// Set a global request timeout. Default: none.
    #[must_use]
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.http.timeout = Some(dur);
        self
    }

    /// Retry policy for transient failures. Default: the crate's standard policy.
    #[must_use]
    pub fn retry_policy(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// # Errors
    ///
    /// Returns an error if the default base cannot be parsed or the HTTP client fails to build.
    pub fn build(self) -> Result<NewsFeed, SfError> {
        let base = match self.base {
            Some(u) => u,
            None => Url::parse(DEFAULT_BASE_NEWS)?,
        };
        Ok(NewsFeed {
            http: self.http.build()?,
            base,
            api_key: self.api_key,
            page_size: self.page_size,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
