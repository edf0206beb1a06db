//! Configuration schema and loading.
//!
//! Configuration comes from a TOML file (`clinops.toml` by default) with
//! `${VAR}` environment substitution and `CLINOPS_*` overrides on top. Every
//! section validates itself before the server starts.

pub mod loader;

pub use loader::load_config;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClinopsConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Patient directory lookup settings.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClinopsConfig {
    /// Validates the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.directory.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl ServerConfig {
    fn validate(&self) -> Result<(), String> {
        self.bind
            .parse::<std::net::SocketAddr>()
            .map(|_| ())
            .map_err(|_| format!("Invalid server.bind address: {:?}", self.bind))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Patient directory settings.
///
/// The timeout bounds the best-effort enrichment call; keeping it short
/// keeps a slow directory from dragging down read responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the person endpoint; the person id is appended.
    #[serde(default = "default_directory_url")]
    pub base_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_directory_timeout_ms")]
    pub timeout_ms: u64,
}

impl DirectoryConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "directory.base_url must be an http(s) URL, got {:?}",
                self.base_url
            ));
        }
        if self.timeout_ms == 0 {
            return Err("directory.timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }

    /// The configured timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_url(),
            timeout_ms: default_directory_timeout_ms(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&self.level.as_str()) {
            return Err(format!(
                "Invalid logging.level {:?}. Must be one of: {}",
                self.level,
                valid.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_directory_url() -> String {
    "http://localhost:8081/api/patients".to_string()
}

fn default_directory_timeout_ms() -> u64 {
    1500
}

fn default_log_level() -> String {
    "info".to_string()
}
