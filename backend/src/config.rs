//! Configuration management for the Livestock Stock Management Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with LSM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Entity store configuration
    pub store: StoreConfig,

    /// Image upload configuration
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Bounded timeout for a single store operation, in milliseconds
    pub op_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Directory attached images are written to
    pub dir: String,

    /// Maximum accepted upload size in bytes
    pub max_bytes: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("LSM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("store.op_timeout_ms", 5000)?
            .set_default("upload.dir", "./data")?
            .set_default("upload.max_bytes", 10_000_000)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LSM_ prefix)
            .add_source(
                Environment::with_prefix("LSM")
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
