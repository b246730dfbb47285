//! Storefront API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults suitable for local development.

use std::env;
use std::net::SocketAddr;

/// Storefront API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database file.
    pub database_path: String,

    /// JWT secret key for signing tokens.
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds.
    pub jwt_lifetime_secs: i64,

    /// Catalog page size.
    pub page_size: u32,

    /// Log filter directive (tracing-subscriber EnvFilter syntax).
    pub log_filter: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            bind_addr: env::var("BOUTIQUE_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BOUTIQUE_BIND_ADDR".to_string()))?,

            database_path: env::var("BOUTIQUE_DATABASE_PATH")
                .unwrap_or_else(|_| "boutique.db".to_string()),

            jwt_secret: env::var("BOUTIQUE_JWT_SECRET").unwrap_or_else(|_| {
                // Predictable secret for development
                // In production, this MUST be set via environment variable
                "boutique-dev-secret-change-in-production".to_string()
            }),

            jwt_lifetime_secs: env::var("BOUTIQUE_JWT_LIFETIME_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BOUTIQUE_JWT_LIFETIME_SECS".to_string()))?,

            page_size: env::var("BOUTIQUE_PAGE_SIZE")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BOUTIQUE_PAGE_SIZE".to_string()))?,

            log_filter: env::var("BOUTIQUE_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        if config.page_size == 0 {
            return Err(ConfigError::InvalidValue("BOUTIQUE_PAGE_SIZE".to_string()));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
