use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to serialize payload: {source}")]
    SerializePayload {
        #[source]
        source: serde_json::Error,
    },
}

/// Per-request transport failure. Never fatal: each one becomes an
/// exception count in the summary.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {message}")]
    Connection { message: String },
    #[error("request failed: {message}")]
    Other { message: String },
}

impl TransportError {
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout;
        }
        let message = err.to_string();
        if err.is_connect() || err.is_request() {
            TransportError::Connection { message }
        } else {
            TransportError::Other { message }
        }
    }
}
