//! Shared HTTP plumbing for the gateway and feed clients.
//! Internals are split into `retry` (policy + send loop) and `constants` (UA + defaults).

pub(crate) mod constants;
mod retry;

pub use retry::{Backoff, RetryConfig};
pub(crate) use retry::send_with_retry;

use std::time::Duration;

use reqwest::Client;

use crate::core::SfError;

/// Transport knobs common to every client builder in this crate.
#[derive(Debug, Clone, Default)]
pub(crate) struct HttpOptions {
    pub(crate) user_agent: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) connect_timeout: Option<Duration>,
}

impl HttpOptions {
    pub(crate) fn build(&self) -> Result<Client, SfError> {
        let mut httpb = reqwest::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(constants::USER_AGENT));

        if let Some(t) = self.timeout {
            httpb = httpb.timeout(t);
        }
        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }

        Ok(httpb.build()?)
    }
}

/// Turn a non-2xx response into `SfError::Status`.
pub(crate) fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, SfError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(SfError::Status {
            status: resp.status().as_u16(),
            url: resp.url().to_string(),
        })
    }
}
