//! Configuration management for the Fleet Operations Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with FLEETOPS_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Scan confirmation configuration
    pub scan: ScanSettings,

    /// External decode capability configuration
    pub decode: DecodeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

/// Settings for the scan confirmation engine, served to clients so the
/// browser engine and the manual-entry filter agree
#[derive(Debug, Deserialize, Clone)]
pub struct ScanSettings {
    /// Voting window size
    pub window_size: usize,

    /// Detections required to confirm
    pub threshold: usize,

    /// Validation policy: "alphanumeric" or "numeric_strict"
    pub policy: String,
}

impl ScanSettings {
    pub fn policy(&self) -> shared::ScanPolicy {
        match self.policy.as_str() {
            "numeric_strict" => shared::ScanPolicy::NumericStrict,
            _ => shared::ScanPolicy::Alphanumeric,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DecodeConfig {
    /// Decode microservice endpoint (still image -> candidate)
    pub endpoint: String,

    /// Decode microservice API key
    pub api_key: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FLEETOPS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("scan.window_size", 3)?
            .set_default("scan.threshold", 2)?
            .set_default("scan.policy", "alphanumeric")?
            .set_default("decode.endpoint", "")?
            .set_default("decode.api_key", "")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FLEETOPS_ prefix)
            .add_source(
                Environment::with_prefix("FLEETOPS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
