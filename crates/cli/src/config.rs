//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `KAGO_STORAGE_DIR` - Directory holding the cart file (default: .kago)
//! - `KAGO_STORAGE_KEY` - Namespace key of the cart record (default: cart-storage)
//! - `KAGO_TAX_RATE` - Tax rate as a decimal fraction (default: 0.10)
//! - `KAGO_FREE_SHIPPING_THRESHOLD` - Subtotal in yen at which shipping is free (default: 10000)
//! - `KAGO_FLAT_SHIPPING` - Shipping fee in yen below the threshold (default: 500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;

use kago_cart::DEFAULT_STORAGE_KEY;
use kago_core::{Price, PricingPolicy};
use rust_decimal::Decimal;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory for file-backed cart storage
    pub storage_dir: PathBuf,
    /// Namespace key of the cart record
    pub storage_key: String,
    /// Tax and shipping rules
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking (optional)
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

impl CliConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed, or if
    /// the resulting pricing policy is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup };

        let tax_rate: Decimal = env.parse_or("KAGO_TAX_RATE", "0.10")?;
        let free_shipping_threshold: Price = env.parse_or("KAGO_FREE_SHIPPING_THRESHOLD", "10000")?;
        let flat_shipping: Price = env.parse_or("KAGO_FLAT_SHIPPING", "500")?;
        let pricing = PricingPolicy::new(tax_rate, free_shipping_threshold, flat_shipping)
            .map_err(|e| ConfigError::InvalidEnvVar("KAGO_TAX_RATE".to_string(), e.to_string()))?;

        let storage_key = env.get_or_default("KAGO_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("KAGO_STORAGE_KEY".to_string()));
        }

        Ok(Self {
            storage_dir: PathBuf::from(env.get_or_default("KAGO_STORAGE_DIR", ".kago")),
            storage_key,
            pricing,
            sentry_dsn: env.get_optional("SENTRY_DSN"),
            sentry_environment: env.get_optional("SENTRY_ENVIRONMENT"),
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating empty values as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from(".kago"));
        assert_eq!(config.storage_key, "cart-storage");
        assert_eq!(config.pricing, PricingPolicy::default());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("KAGO_STORAGE_DIR", "/tmp/carts"),
            ("KAGO_STORAGE_KEY", "guest"),
            ("KAGO_TAX_RATE", "0.08"),
            ("KAGO_FREE_SHIPPING_THRESHOLD", "5000"),
            ("KAGO_FLAT_SHIPPING", "300"),
            ("SENTRY_DSN", "https://key@sentry.invalid/1"),
        ])
        .unwrap();

        assert_eq!(config.storage_dir, PathBuf::from("/tmp/carts"));
        assert_eq!(config.storage_key, "guest");
        assert_eq!(config.pricing.tax_rate(), Decimal::new(8, 2));
        assert_eq!(config.pricing.free_shipping_threshold(), Price::from_yen(5000));
        assert_eq!(config.pricing.flat_shipping(), Price::from_yen(300));
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_empty_value_uses_default() {
        let config = load(&[("KAGO_STORAGE_DIR", ""), ("SENTRY_DSN", "")]).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from(".kago"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_tax_rate() {
        let err = load(&[("KAGO_TAX_RATE", "ten percent")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "KAGO_TAX_RATE"));
    }

    #[test]
    fn test_negative_tax_rate() {
        let err = load(&[("KAGO_TAX_RATE", "-0.1")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_negative_shipping() {
        let err = load(&[("KAGO_FLAT_SHIPPING", "-500")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "KAGO_FLAT_SHIPPING"));
    }

    #[test]
    fn test_blank_storage_key() {
        let err = load(&[("KAGO_STORAGE_KEY", "   ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }
}
