//! Service configuration
//!
//! Built-in defaults overlaid with `MARKETPLACE_*` environment variables,
//! e.g. `MARKETPLACE_PORT=8080` or `MARKETPLACE_STORAGE=memory`. Database
//! settings are read separately by [`common::database::DatabaseConfig`].

use ::config::{Config, ConfigError, Environment as EnvironmentSource};
use serde::{Deserialize, Serialize};

use crate::rate_limiter::RateLimiterConfig;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Whether freshly issued OTP codes may be echoed back to the caller
    pub fn exposes_otp(&self) -> bool {
        !matches!(self, Environment::Production)
    }
}

/// Backing store selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub storage: StorageBackend,
    /// Base of generated meeting links
    pub meeting_base_url: String,
    pub auth_max_attempts: u32,
    pub auth_window_seconds: u64,
    pub auth_ban_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: Environment::Development,
            storage: StorageBackend::Postgres,
            meeting_base_url: "https://meet.google.com".to_string(),
            auth_max_attempts: 5,
            auth_window_seconds: 300,
            auth_ban_seconds: 900,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(EnvironmentSource::with_prefix("MARKETPLACE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rate_limiter(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_attempts: self.auth_max_attempts,
            window_seconds: self.auth_window_seconds,
            ban_duration_seconds: self.auth_ban_seconds,
        }
    }
}
