//! Service configuration, layered from defaults, a TOML file, and
//! `ATELIER_`-prefixed environment variables.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite database file, shared by the artifact, queue, and
    /// notification stores.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("atelier.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Root directory of the local object store.
    pub root: PathBuf,
    /// Key prefix under which staged resources live.
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage"),
            prefix: "artifacts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventsConfig {
    /// Broadcast channel capacity before slow subscribers lag.
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub events: EventsConfig,
}

/// Load configuration, optionally merging a TOML file over the defaults.
/// Environment variables win over both, e.g. `ATELIER_SERVER_PORT=8080`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    let config: Config = figment
        .merge(Env::prefixed("ATELIER_").split("_"))
        .extract()
        .map_err(Box::new)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse configuration from a TOML string (useful for testing).
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml))
        .extract()
        .map_err(Box::new)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid("server.port must be non-zero".into()));
    }
    if config.events.capacity == 0 {
        return Err(ConfigError::Invalid(
            "events.capacity must be non-zero".into(),
        ));
    }
    if config.storage.prefix.is_empty() || config.storage.prefix.contains('/') {
        return Err(ConfigError::Invalid(
            "storage.prefix must be a single path segment".into(),
        ));
    }
    Ok(())
}
