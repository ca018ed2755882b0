//! Client for the external sentiment scoring gateway.

mod api;

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use url::Url;

use crate::core::{
    MergedNewsItem, RetryConfig, SentimentResult, SentimentScorer, SfError,
    client::{
        HttpOptions,
        constants::{DEFAULT_GATEWAY_TIMEOUT_SECS, DEFAULT_GATEWAY_URL},
    },
};

/// Sends merged news batches to the scoring gateway.
///
/// Every call is bounded by `timeout`, retries included. Retries are off by
/// default: a failed batch is reported to the caller and not resent.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    endpoint: Url,
    timeout: Duration,
    retry: RetryConfig,
}

impl Default for GatewayClient {
    fn default() -> Self {
        Self::builder().build().expect("default gateway client")
    }
}

impl GatewayClient {
    /// Create a new builder.
    pub fn builder() -> GatewayClientBuilder {
        GatewayClientBuilder::default()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Score a batch. Results come back in whatever order the gateway returns them.
    ///
    /// An empty batch short-circuits without a request. Result entries the
    /// gateway returns malformed are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Timeout` when the call exceeds the configured timeout,
    /// `SfError::Http`/`SfError::Status` for transport failures, and
    /// `SfError::Json` when the body is not a JSON array.
    #[tracing::instrument(skip(self, batch), err, fields(items = batch.len(), endpoint = %self.endpoint))]
    pub async fn score(&self, batch: &[MergedNewsItem]) -> Result<Vec<SentimentResult>, SfError> {
        api::score_batch(self, batch).await
    }
}

impl SentimentScorer for GatewayClient {
    fn score<'a>(
        &'a self,
        batch: &'a [MergedNewsItem],
    ) -> BoxFuture<'a, Result<Vec<SentimentResult>, SfError>> {
        Box::pin(GatewayClient::score(self, batch))
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct GatewayClientBuilder {
    endpoint: Option<Url>,
    http: HttpOptions,
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
}

impl GatewayClientBuilder {
    /// Override the scoring endpoint (e.g., a mock server in tests).
    #[must_use]
    pub fn endpoint(mut self, url: Url) -> Self {
        self.endpoint = Some(url);
        self
    }

    /// Override the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http.user_agent = Some(ua.into());
        self
    }

    /// Upper bound for one `score` call, retries included. Default: 10s.
    #[must_use]
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    #[must_use]
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.http.connect_timeout = Some(dur);
        self
    }

    /// Retry policy for transient failures. Default: disabled.
    #[must_use]
    pub fn retry_policy(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// # Errors
    ///
    /// Returns an error if the default endpoint cannot be parsed or the HTTP client fails to build.
    pub fn build(self) -> Result<GatewayClient, SfError> {
        let endpoint = match self.endpoint {
            Some(u) => u,
            None => Url::parse(DEFAULT_GATEWAY_URL)?,
        };
        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS));

        let mut http = self.http;
        http.timeout = Some(timeout);

        Ok(GatewayClient {
            http: http.build()?,
            endpoint,
            timeout,
            retry: self.retry.unwrap_or_else(RetryConfig::disabled),
        })
    }
}
