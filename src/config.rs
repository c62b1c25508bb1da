//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server bind address (host:port)
    pub bind_address: String,

    /// Log level
    pub log_level: String,

    /// Simulated processing time for a backup job, in milliseconds
    pub backup_delay_ms: u64,

    /// Superset base URL for the guest-token proxy (optional)
    pub superset_url: Option<String>,

    /// Superset service-account username
    pub superset_username: Option<String>,

    /// Superset service-account password
    pub superset_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://gitdash.db?mode=rwc".into()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            backup_delay_ms: env::var("BACKUP_DELAY_MS")
                .unwrap_or_else(|_| "5000".into())
                .parse()
                .unwrap_or(5000),
            superset_url: env::var("SUPERSET_URL").ok(),
            superset_username: env::var("SUPERSET_USERNAME").ok(),
            superset_password: env::var("SUPERSET_PASSWORD").ok(),
        }
    }
}
