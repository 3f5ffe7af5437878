//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HOUSEHUNT_*)
//! 2. TOML config file (if HOUSEHUNT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::SearchCriteria;

mod validation;

pub use validation::ConfigError;

/// Default bulk listing export endpoint.
pub const DEFAULT_LISTING_BASE_URL: &str = "https://www.redfin.com/stingray/do/gis-search";

/// Default valuation search endpoint.
pub const DEFAULT_VALUATION_BASE_URL: &str = "http://www.zillow.com/webservice/GetSearchResults.htm";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HOUSEHUNT_*)
/// 2. TOML config file (if HOUSEHUNT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite valuation cache.
    ///
    /// Set via HOUSEHUNT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Single-line file holding the valuation service token.
    ///
    /// Set via HOUSEHUNT_TOKEN_FILE environment variable.
    /// Required only when enrichment runs.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via HOUSEHUNT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request HTTP timeout in milliseconds.
    ///
    /// Set via HOUSEHUNT_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Minimum spacing between valuation requests in milliseconds.
    ///
    /// Set via HOUSEHUNT_REQUEST_INTERVAL_MS environment variable.
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,

    /// Bulk listing export endpoint.
    #[serde(default = "default_listing_base_url")]
    pub listing_base_url: String,

    /// Valuation search endpoint.
    #[serde(default = "default_valuation_base_url")]
    pub valuation_base_url: String,

    /// Region identifiers to pull listings for.
    ///
    /// Set via HOUSEHUNT_REGIONS environment variable (e.g. `[9614,20294]`).
    #[serde(default = "default_regions")]
    pub regions: Vec<u64>,

    /// Whether search enriches candidate listings with valuations.
    #[serde(default)]
    pub enrich: bool,

    /// Maximum enrichments in flight. 1 keeps the sequential behavior.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Buyer criteria, e.g. HOUSEHUNT_CRITERIA__PROPERTY__MIN_BEDS=2.
    #[serde(default)]
    pub criteria: SearchCriteria,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./listing-cache.sqlite")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("./ZWSID")
}

fn default_user_agent() -> String {
    concat!("househunt/", env!("CARGO_PKG_VERSION")).into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_request_interval_ms() -> u64 {
    1_000
}

fn default_listing_base_url() -> String {
    DEFAULT_LISTING_BASE_URL.into()
}

fn default_valuation_base_url() -> String {
    DEFAULT_VALUATION_BASE_URL.into()
}

fn default_regions() -> Vec<u64> {
    vec![9614, 20294, 10229]
}

fn default_concurrency() -> usize {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            token_file: default_token_file(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            request_interval_ms: default_request_interval_ms(),
            listing_base_url: default_listing_base_url(),
            valuation_base_url: default_valuation_base_url(),
            regions: default_regions(),
            enrich: false,
            concurrency: default_concurrency(),
            criteria: SearchCriteria::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Minimum valuation request spacing as Duration.
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HOUSEHUNT_`
    /// 2. TOML file from `HOUSEHUNT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HOUSEHUNT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HOUSEHUNT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that the token file exists before any work that needs it starts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the file does not exist.
    pub fn require_token_file(&self) -> Result<&std::path::Path, ConfigError> {
        if self.token_file.is_file() {
            Ok(&self.token_file)
        } else {
            Err(ConfigError::Missing {
                field: "token_file".into(),
                hint: format!(
                    "Create {} with the valuation token on its first line or set HOUSEHUNT_TOKEN_FILE",
                    self.token_file.display()
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./listing-cache.sqlite"));
        assert_eq!(config.token_file, PathBuf::from("./ZWSID"));
        assert!(config.user_agent.starts_with("househunt/"));
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.request_interval_ms, 1_000);
        assert_eq!(config.regions, vec![9614, 20294, 10229]);
        assert!(!config.enrich);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.criteria, SearchCriteria::default());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.request_interval(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_require_token_file_missing() {
        let config = AppConfig { token_file: PathBuf::from("./definitely/not/here/ZWSID"), ..Default::default() };
        let result = config.require_token_file();
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_token_file_present() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = AppConfig { token_file: file.path().to_path_buf(), ..Default::default() };
        assert_eq!(config.require_token_file().unwrap(), file.path());
    }

    #[test]
    fn test_load_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("HOUSEHUNT_DB_PATH", "/tmp/hh.sqlite");
            jail.set_env("HOUSEHUNT_ENRICH", "true");
            jail.set_env("HOUSEHUNT_REGIONS", "[1, 2]");
            jail.set_env("HOUSEHUNT_CRITERIA__PROPERTY__MIN_BEDS", "2");
            jail.set_env("HOUSEHUNT_CRITERIA__LISTING__MAX_LIST_PRICE", "500000");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.db_path, PathBuf::from("/tmp/hh.sqlite"));
            assert!(config.enrich);
            assert_eq!(config.regions, vec![1, 2]);
            assert_eq!(config.criteria.property.min_beds, Some(2.0));
            assert_eq!(config.criteria.listing.max_list_price, Some(500_000.0));
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "househunt.toml",
                r#"
                concurrency = 4
                regions = [9614]

                [criteria.property]
                min_beds = 2
                min_baths = 1.0
                min_sq_ft = 900

                [criteria.listing]
                max_list_price = 360000
                max_valuation = 360000
                "#,
            )?;
            jail.set_env("HOUSEHUNT_CONFIG_FILE", "househunt.toml");
            jail.set_env("HOUSEHUNT_CONCURRENCY", "2");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.concurrency, 2);
            assert_eq!(config.regions, vec![9614]);
            assert_eq!(config.criteria.property.min_sq_ft, Some(900.0));
            assert_eq!(config.criteria.listing.max_valuation, Some(360_000.0));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("HOUSEHUNT_CONCURRENCY", "0");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
