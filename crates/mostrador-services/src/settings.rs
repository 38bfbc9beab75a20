//! Process settings.
//!
//! Loaded from `MOSTRADOR_*` environment variables with fallback to
//! development defaults.

use std::path::PathBuf;

use mostrador_db::DbConfig;
use serde::{Deserialize, Serialize};

use crate::payments::{CheckoutConfig, StripeCheckoutProvider};

const DEFAULT_DATABASE_PATH: &str = "mostrador.db";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_SUCCESS_URL: &str = "http://localhost:3000/checkout/success";
const DEFAULT_CANCEL_URL: &str = "http://localhost:3000/checkout/cancel";

/// Settings shared by the services and the seed binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite file
    pub database_path: PathBuf,

    pub db_max_connections: u32,

    /// Shared secret the payment provider sends with every webhook.
    /// Without it every webhook is rejected.
    pub webhook_secret: Option<String>,

    /// Provider API key. Online checkout is unavailable without it.
    pub stripe_secret_key: Option<String>,

    pub stripe_api_base: String,

    pub checkout_success_url: String,

    pub checkout_cancel_url: String,

    /// ISO 4217, lowercase
    pub currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            db_max_connections: 5,
            webhook_secret: None,
            stripe_secret_key: None,
            stripe_api_base: DEFAULT_STRIPE_API_BASE.to_string(),
            checkout_success_url: DEFAULT_SUCCESS_URL.to_string(),
            checkout_cancel_url: DEFAULT_CANCEL_URL.to_string(),
            currency: "usd".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// ## Environment Variables
    /// - `MOSTRADOR_DATABASE_PATH` (default `mostrador.db`)
    /// - `MOSTRADOR_DB_MAX_CONNECTIONS` (default 5)
    /// - `MOSTRADOR_WEBHOOK_SECRET`
    /// - `MOSTRADOR_STRIPE_SECRET_KEY`
    /// - `MOSTRADOR_STRIPE_API_BASE`
    /// - `MOSTRADOR_CHECKOUT_SUCCESS_URL`, `MOSTRADOR_CHECKOUT_CANCEL_URL`
    /// - `MOSTRADOR_CURRENCY` (default `usd`)
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let db_max_connections = match get("MOSTRADOR_DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| SettingsError::InvalidValue("MOSTRADOR_DB_MAX_CONNECTIONS".to_string()))?,
            None => defaults.db_max_connections,
        };

        let currency = get("MOSTRADOR_CURRENCY")
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or(defaults.currency);
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SettingsError::InvalidValue("MOSTRADOR_CURRENCY".to_string()));
        }

        let settings = Settings {
            database_path: get("MOSTRADOR_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            db_max_connections,
            webhook_secret: get("MOSTRADOR_WEBHOOK_SECRET"),
            stripe_secret_key: get("MOSTRADOR_STRIPE_SECRET_KEY"),
            stripe_api_base: get("MOSTRADOR_STRIPE_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.stripe_api_base),
            checkout_success_url: get("MOSTRADOR_CHECKOUT_SUCCESS_URL")
                .unwrap_or(defaults.checkout_success_url),
            checkout_cancel_url: get("MOSTRADOR_CHECKOUT_CANCEL_URL")
                .unwrap_or(defaults.checkout_cancel_url),
            currency,
        };

        Ok(settings)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.db_max_connections)
    }

    /// The checkout provider, if an API key is configured.
    pub fn stripe_provider(&self) -> Option<StripeCheckoutProvider> {
        self.stripe_secret_key
            .as_ref()
            .map(|key| StripeCheckoutProvider::new(key.clone(), self.stripe_api_base.clone()))
    }

    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig {
            webhook_secret: self.webhook_secret.clone(),
            success_url: self.checkout_success_url.clone(),
            cancel_url: self.checkout_cancel_url.clone(),
            currency: self.currency.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
