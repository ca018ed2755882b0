//! Pipeline configuration with environment overrides.

use std::time::Duration;

use crate::{
    buffer::BufferConfig,
    core::{SfError, client::constants::DEFAULT_GATEWAY_URL},
};

/// Every tunable knob of the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Flush when this many news items are buffered. Default: 10.
    pub batch_size: usize,
    /// Flush whatever is buffered this often. Default: 5s.
    pub flush_interval: Duration,
    /// Inbound queue capacity in front of the buffer. Default: 1024.
    pub queue_capacity: usize,
    /// Scoring endpoint. Default: `http://127.0.0.1:8000/analyze-sentiment`.
    pub gateway_url: String,
    /// Upper bound for one scoring call. Default: 10s.
    pub gateway_timeout: Duration,
    /// Quote poll cadence. Default: 10 minutes.
    pub quote_poll_interval: Duration,
    /// News poll cadence. Default: 30 minutes.
    pub news_poll_interval: Duration,
    /// Only poll quotes during the regular US session. Default: true.
    pub market_hours_only: bool,
    /// Symbols polled by both feeds.
    pub symbols: Vec<String>,
    /// Records older than this are purged. Default: 30 days.
    pub retention: Duration,
    /// How often the retention sweep runs. Default: 24 hours.
    pub retention_sweep_interval: Duration,
    /// Notification channel capacity per subscriber. Default: 1024.
    pub notify_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_interval: Duration::from_secs(5),
            queue_capacity: 1024,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_timeout: Duration::from_secs(10),
            quote_poll_interval: Duration::from_secs(10 * 60),
            news_poll_interval: Duration::from_secs(30 * 60),
            market_hours_only: true,
            symbols: ["AAPL", "TSLA", "MSFT", "GOOGL", "AMZN", "NVDA", "META"]
                .into_iter()
                .map(String::from)
                .collect(),
            retention: Duration::from_secs(30 * 24 * 60 * 60),
            retention_sweep_interval: Duration::from_secs(24 * 60 * 60),
            notify_capacity: 1024,
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `SENTIFLOW_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Config` naming the variable that could not be parsed.
    pub fn from_env() -> Result<Self, SfError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading values through `lookup`.
    ///
    /// Durations are whole seconds, except `SENTIFLOW_RETENTION_DAYS`.
    ///
    /// # Errors
    ///
    /// Returns `SfError::Config` naming the variable that could not be parsed
    /// or that holds an out-of-range value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SfError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = number(&lookup, "SENTIFLOW_BATCH_SIZE")? {
            cfg.batch_size = usize::try_from(v).map_err(|_| invalid("SENTIFLOW_BATCH_SIZE", v))?;
        }
        if let Some(v) = number(&lookup, "SENTIFLOW_FLUSH_INTERVAL_SECS")? {
            cfg.flush_interval = Duration::from_secs(v);
        }
        if let Some(v) = number(&lookup, "SENTIFLOW_QUEUE_CAPACITY")? {
            cfg.queue_capacity =
                usize::try_from(v).map_err(|_| invalid("SENTIFLOW_QUEUE_CAPACITY", v))?;
        }
        if let Some(v) = lookup("SENTIFLOW_GATEWAY_URL") {
            url::Url::parse(&v)
                .map_err(|e| SfError::Config(format!("SENTIFLOW_GATEWAY_URL: {e}")))?;
            cfg.gateway_url = v;
        }
        if let Some(v) = number(&lookup, "SENTIFLOW_GATEWAY_TIMEOUT_SECS")? {
            cfg.gateway_timeout = Duration::from_secs(v);
        }
        if let Some(v) = number(&lookup, "SENTIFLOW_QUOTE_POLL_SECS")? {
            cfg.quote_poll_interval = Duration::from_secs(v);
        }
        if let Some(v) = number(&lookup, "SENTIFLOW_NEWS_POLL_SECS")? {
            cfg.news_poll_interval = Duration::from_secs(v);
        }
        if let Some(v) = lookup("SENTIFLOW_MARKET_HOURS_ONLY") {
            cfg.market_hours_only = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(SfError::Config(format!(
                        "SENTIFLOW_MARKET_HOURS_ONLY: expected a boolean, got '{other}'"
                    )));
                }
            };
        }
        if let Some(v) = lookup("SENTIFLOW_SYMBOLS") {
            cfg.symbols = v
                .split(',')
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = number(&lookup, "SENTIFLOW_RETENTION_DAYS")? {
            cfg.retention = Duration::from_secs(v.saturating_mul(24 * 60 * 60));
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns `SfError::Config` for zero sizes or intervals, or an empty symbol list.
    pub fn validate(&self) -> Result<(), SfError> {
        if self.batch_size == 0 {
            return Err(SfError::Config("batch_size must be at least 1".into()));
        }
        let intervals = [
            ("flush_interval", self.flush_interval),
            ("gateway_timeout", self.gateway_timeout),
            ("quote_poll_interval", self.quote_poll_interval),
            ("news_poll_interval", self.news_poll_interval),
            ("retention_sweep_interval", self.retention_sweep_interval),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, d)| d.is_zero()) {
            return Err(SfError::Config(format!("{name} must be non-zero")));
        }
        if self.symbols.is_empty() {
            return Err(SfError::Config("at least one symbol is required".into()));
        }
        Ok(())
    }

    pub fn buffer(&self) -> BufferConfig {
        BufferConfig {
            batch_size: self.batch_size,
            flush_interval: self.flush_interval,
            queue_capacity: self.queue_capacity,
        }
    }
}

fn number<F>(lookup: &F, key: &str) -> Result<Option<u64>, SfError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| SfError::Config(format!("{key}: '{raw}' is not a whole number: {e}")))
        })
        .transpose()
}

fn invalid(key: &str, v: u64) -> SfError {
    SfError::Config(format!("{key}: {v} is out of range"))
}
