//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides:
//! - `ALUMINUM_HOST`, `ALUMINUM_TOKEN`, `ALUMINUM_ORG_ID`
//! - `ALUMINUM_TIMEOUT_MS`
//! - `ALUMINUM_LOG_LEVEL`, `ALUMINUM_LOG_FORMAT`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Store connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub org_id: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_host() -> String {
    "http://localhost:8086".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            token: String::new(),
            org_id: String::new(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("org_id", &self.org_id)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("aluminum").join("config.toml")),
            Some(PathBuf::from("/etc/aluminum/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply `ALUMINUM_*` environment variables to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("ALUMINUM_HOST") {
            self.connection.host = host;
        }
        if let Some(token) = var("ALUMINUM_TOKEN") {
            self.connection.token = token;
        }
        if let Some(org_id) = var("ALUMINUM_ORG_ID") {
            self.connection.org_id = org_id;
        }
        if let Some(timeout) = var("ALUMINUM_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.connection.request_timeout_ms = ms;
            }
        }

        if let Some(level) = var("ALUMINUM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("ALUMINUM_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Aluminum Configuration
#
# Environment variables override these settings:
# - ALUMINUM_HOST
# - ALUMINUM_TOKEN
# - ALUMINUM_ORG_ID
# - ALUMINUM_TIMEOUT_MS
# - ALUMINUM_LOG_LEVEL
# - ALUMINUM_LOG_FORMAT

[connection]
# Store base URL
host = "http://localhost:8086"

# API token
token = ""

# Organization ID
org_id = ""

# Per-request timeout (ms)
request_timeout_ms = 5000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/aluminum/aluminum.log"
"#
    .to_string()
}
