use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum SfError {
    /// An error occurred during an HTTP request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A JSON payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server returned an unexpected or unsuccessful HTTP status code.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The scoring gateway did not answer within its configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// An item was in an unexpected format or was missing a required field.
    #[error("Data format unexpected or missing field: {0}")]
    Data(String),

    /// A chart range token was not one of the recognized values.
    #[error("unsupported chart range: {0}")]
    UnsupportedRange(String),

    /// A configuration value could not be interpreted.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The persistence layer rejected a write or read.
    #[error("store failure: {0}")]
    Store(String),

    /// A background pipeline task is no longer running.
    #[error("pipeline channel closed")]
    Closed,
}

impl SfError {
    /// Whether the error came from the network path (transport, status, timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. } | Self::Timeout(_))
    }
}
