//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Display name used in greetings and logs.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Address to bind the webhook listener to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the webhook listener to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Maximum database connections in the pool.
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// API token for the upstream release-data feed.
    pub github_token: String,

    /// Telegram transport configuration.
    pub telegram: TelegramConfig,

    /// Catalog sync and notification configuration.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: String,

    /// Secret expected in the webhook's secret-token header.
    pub webhook_secret: String,
}

/// Sync job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Interval between sync runs, in seconds.
    #[serde(default = "default_sync_interval_seconds")]
    pub interval_seconds: u64,

    /// Delay before each upstream version fetch, in milliseconds.
    /// Serializes requests against the upstream rate limit.
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    /// Delay before each notification send, in milliseconds.
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
}

fn default_app_name() -> String {
    "Version Sentry".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_sync_interval_seconds() -> u64 {
    3600
}

fn default_fetch_delay_ms() -> u64 {
    500
}

fn default_send_delay_ms() -> u64 {
    50
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_sync_interval_seconds(),
            fetch_delay_ms: default_fetch_delay_ms(),
            send_delay_ms: default_send_delay_ms(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_has_correct_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.interval_seconds, 3600);
        assert_eq!(config.fetch_delay_ms, 500);
        assert_eq!(config.send_delay_ms, 50);
    }
}
