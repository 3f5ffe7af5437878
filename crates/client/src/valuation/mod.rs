//! Per-property valuation provider.
//!
//! ### Protocol
//!
//! - **Endpoint**: `GetSearchResults.htm`, one GET per property
//! - **Authentication**: `zws-id` query parameter, read from the first line of a token file
//! - **Query**: `address` is the street address, `citystatezip` is the ZIP code alone
//! - **Rate Limiting**: minimum interval between requests, shared by clones of the client
//! - **Response**: XML search results, reduced to one [`Valuation`](househunt_core::Valuation) by [`reduce`]

pub mod error;
pub mod response;

pub use error::ValuationError;
pub use response::{SearchResults, reduce};

use async_trait::async_trait;
use househunt_core::Property;
use househunt_core::config::DEFAULT_VALUATION_BASE_URL;
use reqwest::header;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "househunt/0.1";

/// Default minimum interval between requests.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Valuation client configuration.
#[derive(Debug, Clone)]
pub struct ValuationConfig {
    /// Credential sent as `zws-id`.
    pub token: String,
    /// Search endpoint.
    pub base_url: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    pub user_agent: String,
    /// Minimum spacing between requests (default: 1s).
    pub min_interval: Duration,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: DEFAULT_VALUATION_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

impl ValuationConfig {
    /// Load the credential from a token file.
    ///
    /// The token is the first line with surrounding whitespace removed.
    pub fn from_token_file(path: impl AsRef<Path>) -> Result<Self, ValuationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ValuationError::TokenFile { path: path.to_path_buf(), source })?;

        let token = contents.lines().next().unwrap_or_default().trim();
        if token.is_empty() {
            return Err(ValuationError::MissingToken);
        }

        Ok(Self { token: token.to_string(), ..Default::default() })
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Source of candidate valuations for a property.
///
/// Implementations must be shareable across tasks; the enricher calls
/// `fetch` concurrently for distinct properties.
#[async_trait]
pub trait ValuationProvider: Send + Sync {
    async fn fetch(&self, property: &Property) -> Result<SearchResults, ValuationError>;
}

/// HTTP valuation client.
#[derive(Debug, Clone)]
pub struct ValuationClient {
    http: reqwest::Client,
    config: ValuationConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl ValuationClient {
    /// Create a new valuation client with the given configuration.
    pub fn new(config: ValuationConfig) -> Result<Self, ValuationError> {
        if config.token.trim().is_empty() {
            return Err(ValuationError::MissingToken);
        }

        url::Url::parse(&config.base_url).map_err(|e| ValuationError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ValuationError::Network(Arc::new(e)))?;

        let rate_limiter = Arc::new(RateLimiter::new(config.min_interval));
        Ok(Self { http, config, rate_limiter })
    }
}

#[async_trait]
impl ValuationProvider for ValuationClient {
    async fn fetch(&self, property: &Property) -> Result<SearchResults, ValuationError> {
        self.rate_limiter.acquire().await;

        let start = Instant::now();
        tracing::debug!("valuation lookup: {}", property);

        let http_response = self
            .http
            .get(&self.config.base_url)
            .header(header::USER_AGENT, &self.config.user_agent)
            .header(header::ACCEPT, "application/xml,text/xml;q=0.9,*/*;q=0.8")
            .query(&[
                ("zws-id", self.config.token.as_str()),
                ("address", property.street_address.as_str()),
                ("citystatezip", property.zip_code.as_str()),
            ])
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("valuation response status: {}", status);

        if status == 401 || status == 403 {
            return Err(ValuationError::AuthError);
        }

        if status == 429 {
            return Err(ValuationError::RateLimited);
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(ValuationError::HttpError { status: status.as_u16() });
        }

        let body = http_response.text().await?;
        let results = SearchResults::parse(&body);
        if let Some(code) = results.message_code().filter(|code| *code != 0) {
            tracing::debug!("valuation service message code {code} for {}", property);
        }

        tracing::debug!("valuation lookup completed in {:?}, {} results", start.elapsed(), results.result_count());

        Ok(results)
    }
}
