//! Logging setup
//!
//! Installs a `tracing` subscriber from [`LoggingConfig`]: an `EnvFilter`
//! (`RUST_LOG` wins over the configured level) and a pretty or JSON fmt
//! layer, written to stderr or to the configured file.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Logging setup errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to open log file {path}: {error}")]
    File { path: String, error: String },

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Filter directive for a configured level
fn directive(level: &str) -> String {
    format!("aluminum={}", level.trim().to_lowercase())
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive(&config.level)))
        .map_err(|e| LoggingError::Filter(e.to_string()))?;

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| LoggingError::File {
                    path: path.clone(),
                    error: e.to_string(),
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let layer = match config.format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive() {
        assert_eq!(directive("info"), "aluminum=info");
        assert_eq!(directive(" DEBUG "), "aluminum=debug");
    }

    #[test]
    fn test_bad_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            file: Some(dir.path().join("missing").join("x.log").display().to_string()),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config), Err(LoggingError::File { .. })));
    }
}
