//! Configuration management for the liquor inventory server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with LIM_ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::reconciliation::EngineOptions;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Report engine configuration
    pub reports: ReportsConfig,
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
pub struct ReportsConfig {
    /// Upper bound for loading and computing one report, in seconds
    pub timeout_secs: u64,

    /// Number of products / ingredients at which aggregation goes parallel
    pub parallel_threshold: usize,
}

impl ReportsConfig {
    /// Deadline for a run; a per-request value may only shorten it
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        let ceiling = Duration::from_secs(self.timeout_secs);
        match requested {
            Some(requested) => requested.min(ceiling),
            None => ceiling,
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::with_threshold(self.parallel_threshold)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("LIM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("reports.timeout_secs", 30)?
            .set_default("reports.parallel_threshold", 16)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LIM_ prefix)
            .add_source(
                Environment::with_prefix("LIM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
