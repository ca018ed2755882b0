use std::time::Duration;

use tracing::warn;

use crate::core::SfError;

/// Specifies the backoff strategy for retrying failed requests.
#[derive(Clone, Debug)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed(Duration),
    /// Uses an exponential delay between retries.
    /// The delay is calculated as `base * (factor ^ attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
    },
}

impl Backoff {
    /// Delay before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(d) => *d,
            Self::Exponential { base, factor, max } => {
                let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
                let scaled = base.as_secs_f64() * factor.powi(exp);
                if scaled.is_finite() && scaled < max.as_secs_f64() {
                    Duration::from_secs_f64(scaled)
                } else {
                    *max
                }
            }
        }
    }
}

/// Configuration for the automatic retry mechanism.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Enables or disables the retry mechanism.
    pub enabled: bool,
    /// The maximum number of retries to attempt. The total number of attempts will be `max_retries + 1`.
    pub max_retries: u32,
    /// The backoff strategy to use between retries.
    pub backoff: Backoff,
    /// A list of HTTP status codes that should trigger a retry.
    pub retry_on_status: Vec<u16>,
    /// Whether to retry on request timeouts.
    pub retry_on_timeout: bool,
    /// Whether to retry on connection errors.
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 4,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(200),
                factor: 2.0,
                max: Duration::from_secs(3),
            },
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl RetryConfig {
    /// A policy that sends each request exactly once.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Send `req`, retrying transient failures according to `cfg`.
///
/// Requests whose body cannot be cloned are sent once.
pub(crate) async fn send_with_retry(
    req: reqwest::RequestBuilder,
    cfg: &RetryConfig,
) -> Result<reqwest::Response, SfError> {
    if !cfg.enabled {
        return Ok(req.send().await?);
    }

    let mut attempt: u32 = 0;
    loop {
        let Some(this) = req.try_clone() else {
            return Ok(req.send().await?);
        };
        let can_retry = attempt < cfg.max_retries;

        match this.send().await {
            Ok(resp) if can_retry && cfg.retry_on_status.contains(&resp.status().as_u16()) => {
                warn!(status = resp.status().as_u16(), attempt, url = %resp.url(), "retryable status");
            }
            Ok(resp) => return Ok(resp),
            Err(e)
                if can_retry
                    && ((e.is_timeout() && cfg.retry_on_timeout)
                        || (e.is_connect() && cfg.retry_on_connect)) =>
            {
                warn!(error = %e, attempt, "retryable transport error");
            }
            Err(e) => return Err(e.into()),
        }

        tokio::time::sleep(cfg.backoff.delay(attempt)).await;
        attempt += 1;
    }
}
