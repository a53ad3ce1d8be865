//! Synchronization layer configuration.
//!
//! [`SyncConfig::default`] matches the stock deployment (remote service on
//! `http://localhost:5000/api`, both stores remote-backed). Hosts that
//! configure themselves from the environment can call
//! [`SyncConfig::from_env`].
//!
//! # Environment Variables
//!
//! All optional:
//! - `TALLY_API_BASE_URL` - Remote service base URL (default: `http://localhost:5000/api`)
//! - `TALLY_PRODUCT_STRATEGY` - `remote` or `local` (default: remote)
//! - `TALLY_PURCHASE_STRATEGY` - `remote` or `local` (default: remote)
//! - `TALLY_CACHE_DIR` - Directory for the durable product cache (default: in-memory cache)
//! - `TALLY_CACHE_KEY` - Cache key of the product snapshot (default: `productsData`)
//! - `TALLY_REQUEST_TIMEOUT_SECS` - Deadline for remote calls and cache reads, `0` disables (default: 30)
//! - `TALLY_LOW_STOCK_THRESHOLD` - Quantity at or below which stock counts as low (default: 10)
//! - `TALLY_LOG_FORMAT` - `text` or `json`, for [`crate::telemetry::init_tracing`] (default: text)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cache::DEFAULT_CACHE_KEY;
use crate::remote::DEFAULT_BASE_URL;
use crate::strategy::SyncStrategy;
use crate::telemetry::LogFormat;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Configuration for an [`crate::AppContext`] and its stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Remote service base URL
    pub api_base_url: String,
    /// Backing source of the product store
    pub product_strategy: SyncStrategy,
    /// Backing source of the purchase store
    pub purchase_strategy: SyncStrategy,
    /// Directory of the durable product cache; `None` keeps the cache in memory
    pub cache_dir: Option<PathBuf>,
    /// Cache key of the product snapshot
    pub cache_key: String,
    /// Deadline for every remote call and cache read; `None` waits forever.
    /// Cache writes always run to completion.
    pub request_timeout: Option<Duration>,
    /// Quantity at or below which stock counts as low
    pub low_stock_threshold: u32,
    /// Log output format for hosts that install the crate's subscriber
    pub log_format: LogFormat,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            product_strategy: SyncStrategy::Remote,
            purchase_strategy: SyncStrategy::Remote,
            cache_dir: None,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            log_format: LogFormat::default(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_url = lookup("TALLY_API_BASE_URL").unwrap_or(defaults.api_base_url);
        Url::parse(&api_base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TALLY_API_BASE_URL".to_string(), e.to_string())
        })?;

        let product_strategy = parse_var(&lookup, "TALLY_PRODUCT_STRATEGY")?
            .unwrap_or(defaults.product_strategy);
        let purchase_strategy = parse_var(&lookup, "TALLY_PURCHASE_STRATEGY")?
            .unwrap_or(defaults.purchase_strategy);
        let cache_dir = lookup("TALLY_CACHE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        let cache_key = lookup("TALLY_CACHE_KEY").unwrap_or(defaults.cache_key);
        let request_timeout = match parse_var::<u64>(&lookup, "TALLY_REQUEST_TIMEOUT_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.request_timeout,
        };
        let low_stock_threshold = parse_var(&lookup, "TALLY_LOW_STOCK_THRESHOLD")?
            .unwrap_or(defaults.low_stock_threshold);
        let log_format =
            parse_var(&lookup, "TALLY_LOG_FORMAT")?.unwrap_or(defaults.log_format);

        Ok(Self {
            api_base_url,
            product_strategy,
            purchase_strategy,
            cache_dir,
            cache_key,
            request_timeout,
            low_stock_threshold,
            log_format,
        })
    }

    /// Use `strategy` for both stores.
    #[must_use]
    pub fn with_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.product_strategy = strategy;
        self.purchase_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether either store talks to the remote service.
    #[must_use]
    pub const fn needs_remote(&self) -> bool {
        self.product_strategy.is_remote() || self.purchase_strategy.is_remote()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = SyncConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.cache_key, "productsData");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.needs_remote());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = SyncConfig::from_lookup(lookup_from(&[
            ("TALLY_API_BASE_URL", "https://shop.example/api"),
            ("TALLY_PRODUCT_STRATEGY", "local"),
            ("TALLY_PURCHASE_STRATEGY", "local"),
            ("TALLY_CACHE_DIR", "/var/lib/tally"),
            ("TALLY_CACHE_KEY", "catalog"),
            ("TALLY_REQUEST_TIMEOUT_SECS", "5"),
            ("TALLY_LOW_STOCK_THRESHOLD", "3"),
            ("TALLY_LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://shop.example/api");
        assert_eq!(config.product_strategy, SyncStrategy::Local);
        assert_eq!(config.purchase_strategy, SyncStrategy::Local);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/lib/tally")));
        assert_eq!(config.cache_key, "catalog");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.low_stock_threshold, 3);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.needs_remote());
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config =
            SyncConfig::from_lookup(lookup_from(&[("TALLY_REQUEST_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_invalid_strategy() {
        let err = SyncConfig::from_lookup(lookup_from(&[("TALLY_PRODUCT_STRATEGY", "both")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TALLY_PRODUCT_STRATEGY"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = SyncConfig::from_lookup(lookup_from(&[("TALLY_API_BASE_URL", "localhost")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TALLY_API_BASE_URL"));
    }

    #[test]
    fn test_invalid_log_format() {
        let err = SyncConfig::from_lookup(lookup_from(&[("TALLY_LOG_FORMAT", "yaml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TALLY_LOG_FORMAT"));
    }

    #[test]
    fn test_invalid_number() {
        assert!(
            SyncConfig::from_lookup(lookup_from(&[("TALLY_LOW_STOCK_THRESHOLD", "-1")])).is_err()
        );
    }
}
