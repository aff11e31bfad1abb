//! # Observability
//!
//! Structured logging for pg2json.
//!
//! Binaries call [`init_with_config`] once at startup and use the standard
//! `tracing` macros everywhere else. Every event is written as one JSON
//! object per line to `~/.pg2json/logs/pg2json.jsonl` (or a configured
//! path), so the stream can be followed with `tail -f ... | jq`.
//!
//! Fields whose names mark them as secrets (`password`, `secret`, ...) are
//! replaced with `"[redacted]"` before they reach the file.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "pg2json".into(),
//!     default_level: "debug".into(),
//!     ..Default::default()
//! })?;
//! tracing::info!("ready");
//! ```

mod json_layer;
mod writer;

pub use json_layer::{JsonLayer, LogEntry, REDACTED};
pub use writer::{LogFileWriter, WriterFactory};

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every log line.
    pub service_name: String,

    /// Default level filter (e.g. "debug", "info").
    /// `RUST_LOG` takes precedence when set.
    pub default_level: String,

    /// Log file path. Defaults to `~/.pg2json/logs/pg2json.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit compact human-readable logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "pg2json".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Default central log location.
pub fn default_log_path() -> io::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "could not determine home directory")
    })?;
    Ok(home.join(".pg2json").join("logs").join("pg2json.jsonl"))
}

/// Install the global subscriber described by `config`.
///
/// Fails if the log file cannot be opened. Installing twice is a no-op.
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    let log_path = match config.log_path.clone() {
        Some(path) => path,
        None => default_log_path()?,
    };

    let writer = LogFileWriter::open(&log_path)?;
    let json_layer = JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer));

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact()
            .with_writer(io::stderr)
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer.with_filter(level_filter(&config.default_level)))
        .with(stderr_layer.map(|l| l.with_filter(level_filter(&config.default_level))))
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(log_path = %log_path.display(), "observability initialized");
    }
    Ok(())
}

fn level_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "pg2json");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_default_log_path_layout() {
        if let Ok(path) = default_log_path() {
            assert!(path.ends_with(".pg2json/logs/pg2json.jsonl"));
        }
    }

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("init.jsonl");

        init_with_config(LogConfig {
            log_path: Some(path.clone()),
            ..Default::default()
        })
        .unwrap();

        assert!(path.exists());
    }
}
