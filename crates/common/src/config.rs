//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// VAPID signing keys for the Web Push transport.
    #[serde(default)]
    pub vapid: VapidSettings,
    /// Cron trigger configuration.
    pub cron: CronConfig,
    /// Notification dispatch tuning.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// VAPID key material for Web Push.
///
/// Both keys are base64 URL-safe encoded. Presence is validated when the
/// transport is constructed, not here, so that the error can name exactly
/// which values are missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VapidSettings {
    /// Public key.
    #[serde(default)]
    pub public_key: String,
    /// Private key.
    #[serde(default)]
    pub private_key: String,
    /// Subject claim (mailto: or https: URL).
    #[serde(default = "default_vapid_subject")]
    pub subject: String,
}

/// Cron trigger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CronConfig {
    /// Bearer token required on the cron endpoints.
    pub secret: String,
}

/// Notification dispatch tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Days the sent-event ledger is retained.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Maximum concurrent push deliveries per dispatch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_vapid_subject() -> String {
    "mailto:info@lunary.app".to_string()
}

const fn default_retention_days() -> u32 {
    1
}

const fn default_concurrency() -> usize {
    32
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `LUNARY_ENV`)
    /// 3. Environment variables with `LUNARY_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("LUNARY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LUNARY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("LUNARY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
