//! TOML-file-plus-environment configuration, layered over built-in defaults.
//!
//! Environment variables are read with the `VAULT_INGEST_` prefix and `__`
//! as the nesting separator, e.g. `VAULT_INGEST_ENGINE__BATCH_THRESHOLD`.
//! A malformed config file or an env var that fails to deserialize into its
//! field's type is startup-fatal.

use serde::Deserialize;

use crate::prelude::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub batch_threshold: usize,
    pub data_center_suffix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_threshold: vault_ingest_core::engine::DEFAULT_BATCH_THRESHOLD,
            data_center_suffix: vault_ingest_core::engine::DEFAULT_DATA_CENTER_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShmConfig {
    pub region_name: String,
    pub region_size_bytes: usize,
    pub poll_interval_ms: u64,
}

impl Default for ShmConfig {
    fn default() -> Self {
        Self {
            region_name: "/vault-ingest-block".to_string(),
            region_size_bytes: 10 * 1024 * 1024,
            poll_interval_ms: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub flight_uri: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            flight_uri: "grpc://127.0.0.1:50051".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubscriberConfig {
    pub redis_url: String,
    pub channel: String,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            channel: "pool-monitor".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub hot_address_seed_path: String,
    pub shm: ShmConfig,
    pub sink: SinkConfig,
    pub subscriber: SubscriberConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load `path` (if it exists) layered under `VAULT_INGEST_`-prefixed
    /// environment overrides, on top of the built-in defaults above.
    pub fn load(path: &std::path::Path) -> Result<Self, Error> {
        let source = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("VAULT_INGEST")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(Error::config)?;

        source.try_deserialize().map_err(Error::config)
    }
}
