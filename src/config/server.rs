//! Application configuration loaded from `config.toml` and the environment.
//!
//! The file is optional. Values are resolved in this order: built-in defaults, then
//! `config.toml`, then environment variables (`SERVER_HOST`, `SERVER_PORT`,
//! `CORS_ORIGIN`, `DATABASE_URL`), which may come from a `.env` file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Full contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Storage settings
    pub database: DatabaseConfig,
}

/// `[server]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// `[database]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: super::database::DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Address string suitable for `TcpListener::bind`.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Applies environment variable overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.server.port = port.parse().map_err(|e| Error::Config {
                message: format!("SERVER_PORT must be a port number: {e}"),
            })?;
        }
        if let Ok(origin) = std::env::var("CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path_ref:?}: {e}"),
    })
}

/// Loads `./config.toml` when present, otherwise defaults, then applies the
/// environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    let mut config = if path.exists() {
        load_config(path)?
    } else {
        tracing::info!("No config.toml found, using defaults");
        AppConfig::default()
    };
    config.apply_env_overrides()?;
    Ok(config)
}
