//! Bulk listing source.
//!
//! ### Region template
//! - One immutable query template; only `region_id` varies
//! - Fixed filters for price range, status, property types and CSV output
//!
//! ### Ingest
//! - CSV body with a header row, columns matched by name
//! - Rows missing any expected column are dropped, not reported

pub mod ingest;
pub mod region;

use reqwest::{Client, header};
use std::time::{Duration, Instant};
use url::Url;

pub use ingest::parse_listings_csv;
pub use region::{RegionId, RegionQuery};

use househunt_core::{Error, Listing};

/// Configuration for the listing client.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// User agent string (default: "househunt/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { user_agent: "househunt/0.1".to_string(), timeout: Duration::from_millis(20000) }
    }
}

/// HTTP client for the bulk listing export.
pub struct ListingClient {
    http: Client,
}

impl ListingClient {
    /// Create a new listing client with the given configuration.
    pub fn new(config: &ListingConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Download one region's export and parse it into listings.
    pub async fn fetch_region(&self, url: &Url) -> Result<Vec<Listing>, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/csv,text/plain;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("{url}: {e}"))
                } else {
                    Error::HttpError(format!("network error: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        let listings = parse_listings_csv(&body);

        tracing::debug!(
            "fetched {} in {}ms ({} bytes, {} listings)",
            url,
            start.elapsed().as_millis(),
            body.len(),
            listings.len()
        );

        Ok(listings)
    }

    /// Download every region in order and concatenate the listings.
    ///
    /// The first failing region aborts the run.
    pub async fn fetch_all(&self, urls: &[Url]) -> Result<Vec<Listing>, Error> {
        let mut listings = Vec::new();
        for url in urls {
            listings.extend(self.fetch_region(url).await?);
        }
        tracing::info!(regions = urls.len(), listings = listings.len(), "listing export loaded");
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_config_default() {
        let config = ListingConfig::default();
        assert_eq!(config.user_agent, "househunt/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
    }

    #[tokio::test]
    async fn test_listing_client_new() {
        let client = ListingClient::new(&ListingConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_all_empty() {
        let client = ListingClient::new(&ListingConfig::default()).unwrap();
        let listings = client.fetch_all(&[]).await.unwrap();
        assert!(listings.is_empty());
    }
}
