//! # Configuration Module
//!
//! Environment-driven configuration for the planner, the resolver backends and
//! the CLI. `.env` is loaded by the binary before [`AppConfig::from_env`] runs.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_PRODUCT_ID: &str = "-//MsosiHub//Kenyan Meal Planner//EN";
/// How many saved plans a user sees, newest first
pub const DEFAULT_SAVED_PLAN_LIMIT: i64 = 5;

/// Recovery configuration for ingredient lookups
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of dishes resolved at the same time
    pub concurrency: usize,
    /// Timeout for one dish lookup in seconds
    pub operation_timeout_secs: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Consecutive failures before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// Seconds before an open circuit lets requests through again
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            operation_timeout_secs: 10,
            max_retries: 3,
            base_retry_delay_ms: 250,
            max_retry_delay_ms: 4000,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
        }
    }
}

impl RecoveryConfig {
    /// Timeout for a single attempt at one dish lookup
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Upper bound on one dish lookup: every attempt plus the longest backoff
    /// between them
    pub fn lookup_budget(&self) -> Duration {
        let attempts = self.max_retries.saturating_add(1);
        self.operation_timeout()
            .saturating_mul(attempts)
            .saturating_add(Duration::from_millis(self.max_retry_delay_ms).saturating_mul(self.max_retries))
    }

    /// Read overrides from the environment, keeping defaults for unset keys
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            concurrency: env_or("RESOLVER_CONCURRENCY", defaults.concurrency)?.max(1),
            operation_timeout_secs: env_or("RESOLVER_TIMEOUT_SECS", defaults.operation_timeout_secs)?
                .max(1),
            max_retries: env_or("RESOLVER_MAX_RETRIES", defaults.max_retries)?,
            base_retry_delay_ms: env_or("RESOLVER_RETRY_BASE_MS", defaults.base_retry_delay_ms)?,
            max_retry_delay_ms: env_or("RESOLVER_RETRY_MAX_MS", defaults.max_retry_delay_ms)?,
            circuit_breaker_threshold: env_or(
                "RESOLVER_CIRCUIT_THRESHOLD",
                defaults.circuit_breaker_threshold,
            )?,
            circuit_breaker_reset_secs: env_or(
                "RESOLVER_CIRCUIT_RESET_SECS",
                defaults.circuit_breaker_reset_secs,
            )?,
        })
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the recipe API (the resolver appends `/api/recipes/...`)
    pub api_url: String,
    /// PostgreSQL connection string; when set, recipes are read from the database
    pub database_url: Option<String>,
    /// Locale for user-facing notices ("en" or "sw")
    pub locale: String,
    /// PRODID line of exported calendars
    pub calendar_product_id: String,
    pub recovery: RecoveryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            database_url: None,
            locale: DEFAULT_LOCALE.to_string(),
            calendar_product_id: DEFAULT_PRODUCT_ID.to_string(),
            recovery: RecoveryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            api_url: env::var("MSOSIHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            locale: env::var("MSOSIHUB_LOCALE").unwrap_or(defaults.locale),
            calendar_product_id: env::var("MSOSIHUB_CALENDAR_PRODID")
                .unwrap_or(defaults.calendar_product_id),
            recovery: RecoveryConfig::from_env()?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {value}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_defaults_are_sane() {
        let recovery = RecoveryConfig::default();
        assert!(recovery.concurrency >= 1);
        assert!(recovery.operation_timeout_secs > 0);
        assert!(recovery.max_retries <= 10);
        assert!(recovery.base_retry_delay_ms <= recovery.max_retry_delay_ms);
        assert_eq!(recovery.operation_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_lookup_budget_covers_retries() {
        let recovery = RecoveryConfig {
            operation_timeout_secs: 2,
            max_retries: 2,
            max_retry_delay_ms: 500,
            ..Default::default()
        };
        assert_eq!(recovery.lookup_budget(), Duration::from_secs(7));

        let no_retries = RecoveryConfig {
            max_retries: 0,
            ..recovery
        };
        assert_eq!(no_retries.lookup_budget(), no_retries.operation_timeout());
    }

    #[test]
    fn test_zero_timeout_is_raised_to_one_second() {
        env::set_var("RESOLVER_TIMEOUT_SECS", "0");
        let recovery = RecoveryConfig::from_env();
        env::remove_var("RESOLVER_TIMEOUT_SECS");

        let recovery = recovery.unwrap();
        assert_eq!(recovery.operation_timeout_secs, 1);
        assert!(recovery.lookup_budget() >= Duration::from_secs(1));
    }

    #[test]
    fn test_app_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.locale, "en");
        assert!(config.database_url.is_none());
        assert!(config.calendar_product_id.starts_with("-//"));
    }

    #[test]
    fn test_env_or_falls_back_and_rejects_garbage() {
        assert_eq!(env_or("MSOSIHUB_TEST_UNSET_KEY", 7u32).unwrap(), 7);

        env::set_var("MSOSIHUB_TEST_GARBAGE_KEY", "seven");
        assert!(env_or("MSOSIHUB_TEST_GARBAGE_KEY", 7u32).is_err());
        env::remove_var("MSOSIHUB_TEST_GARBAGE_KEY");
    }
}
