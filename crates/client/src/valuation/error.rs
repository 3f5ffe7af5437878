//! Valuation provider error types.

use std::path::PathBuf;
use std::sync::Arc;

/// Errors from the valuation provider.
#[derive(Debug, thiserror::Error)]
pub enum ValuationError {
    /// Token file absent or unreadable.
    #[error("cannot read valuation token file {}: {source}", path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token file present but its first line is empty.
    #[error("missing valuation token")]
    MissingToken,

    /// Endpoint is not a usable URL.
    #[error("invalid valuation endpoint: {0}")]
    InvalidUrl(String),

    /// Authentication failed (token rejected).
    #[error("authentication failed: valuation token rejected")]
    AuthError,

    /// Rate limited by the valuation service.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),
}

impl ValuationError {
    /// Whether the same request may succeed if tried again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ValuationError::Timeout | ValuationError::RateLimited | ValuationError::Network(_) => true,
            ValuationError::HttpError { status } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ValuationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ValuationError::Timeout } else { ValuationError::Network(Arc::new(err)) }
    }
}
