use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::core::{
    PricePoint, RetryConfig, SfError,
    client::{HttpOptions, constants::DEFAULT_BASE_QUOTE, ensure_success, send_with_retry},
};

#[derive(Deserialize)]
struct QuoteWire {
    /// Current price.
    c: Option<Decimal>,
}

/// Polls the latest price for a symbol.
#[derive(Debug, Clone)]
pub struct QuoteFeed {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
    retry: RetryConfig,
}

impl QuoteFeed {
    /// Create a new builder.
    pub fn builder() -> QuoteFeedBuilder {
        QuoteFeedBuilder::default()
    }

    /// Fetch the current price, stamped with the fetch instant.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Data` when the response has no current price, or a
    /// transport/status error if the request fails.
    #[tracing::instrument(skip(self), err)]
    pub async fn fetch(&self, symbol: &str) -> Result<PricePoint, SfError> {
        let mut url = self.base.join("quote")?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("symbol", symbol);
            if let Some(token) = &self.token {
                qp.append_pair("token", token);
            }
        }

        let req = self.http.get(url).header("accept", "application/json");
        let resp = ensure_success(send_with_retry(req, &self.retry).await?)?;
        let body = resp.text().await?;
        let wire: QuoteWire = serde_json::from_str(&body)?;

        let price = wire
            .c
            .ok_or_else(|| SfError::Data(format!("quote for {symbol}: missing current price")))?;

        Ok(PricePoint {
            timestamp: Utc::now(),
            symbol: symbol.to_string(),
            price,
        })
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct QuoteFeedBuilder {
    base: Option<Url>,
    token: Option<String>,
    http: HttpOptions,
    retry: Option<RetryConfig>,
}

impl QuoteFeedBuilder {
    /// Override the API base (e.g., `https://finnhub.io/api/v1/`). `quote` is appended.
    #[must_use]
    pub fn base(mut self, url: Url) -> Self {
        self.base = Some(url);
        self
    }

    /// API token sent as the `token` query parameter.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
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
    pub fn build(self) -> Result<QuoteFeed, SfError> {
        let base = match self.base {
            Some(u) => u,
            None => Url::parse(DEFAULT_BASE_QUOTE)?,
        };
        Ok(QuoteFeed {
            http: self.http.build()?,
            base,
            token: self.token,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
