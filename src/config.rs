use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ingestion: IngestionConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// "text" or "json"
    pub log_format: String,
    /// "production" or "development"; development exposes error detail in 500 bodies
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            environment: "production".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            url: "sqlite:./data/logs.db".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub enabled: bool,
    pub buffer_size: usize,
    pub max_redeliveries: u32,
    pub redelivery_delay_ms: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_size: 1024,
            max_redeliveries: 3,
            redelivery_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
        }
    }
}

/// Load configuration from an optional TOML file, overridden by
/// `LOG_SERVICE__<SECTION>__<KEY>` environment variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("LOG_SERVICE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("Server port must be greater than 0");
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid log format: {} (expected 'text' or 'json')", other),
    }

    match cfg.server.environment.as_str() {
        "development" | "production" => {}
        other => anyhow::bail!(
            "Invalid environment: {} (expected 'development' or 'production')",
            other
        ),
    }

    if cfg.database.backend == StorageBackend::Sqlite && cfg.database.url.trim().is_empty() {
        anyhow::bail!("Database URL cannot be empty for the sqlite backend");
    }

    if cfg.database.max_connections == 0 {
        anyhow::bail!("Database max_connections must be greater than 0");
    }

    if cfg.ingestion.enabled && cfg.ingestion.buffer_size == 0 {
        anyhow::bail!("Ingestion buffer_size must be greater than 0");
    }

    if cfg.metrics.enabled && !cfg.metrics.endpoint.starts_with('/') {
        anyhow::bail!("Metrics endpoint must start with '/': {}", cfg.metrics.endpoint);
    }

    Ok(())
}
