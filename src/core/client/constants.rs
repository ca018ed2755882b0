//! Centralized constants for default endpoints and UA.

pub(crate) const USER_AGENT: &str = concat!("sentiflow-rs/", env!("CARGO_PKG_VERSION"));

/// Sentiment scoring gateway (batch POST).
pub(crate) const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8000/analyze-sentiment";

/// Quote API base; `quote` is appended.
pub(crate) const DEFAULT_BASE_QUOTE: &str = "https://finnhub.io/api/v1/";

/// News API base; `everything` is appended.
pub(crate) const DEFAULT_BASE_NEWS: &str = "https://newsapi.org/v2/";

/// Default per-call timeout for the scoring gateway.
pub(crate) const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
