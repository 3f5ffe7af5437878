//! Range and format checks on a loaded `AppConfig`.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed =
        url::Url::parse(value).map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::Invalid { field: field.into(), reason: format!("unsupported scheme: {scheme}") }),
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `request_interval_ms` exceeds 1 minute
    /// - `user_agent` is empty
    /// - `concurrency` is 0
    /// - either base URL is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.request_interval_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "request_interval_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.concurrency == 0 {
            return Err(ConfigError::Invalid { field: "concurrency".into(), reason: "must be at least 1".into() });
        }

        check_url("listing_base_url", &self.listing_base_url)?;
        check_url("valuation_base_url", &self.valuation_base_url)?;

        let unique: HashSet<_> = self.regions.iter().collect();
        if unique.len() != self.regions.len() {
            tracing::warn!(
                region_count = self.regions.len(),
                unique_count = unique.len(),
                "Duplicate region ids configured; each duplicate is fetched again"
            );
        }

        Ok(())
    }
}
