//! Logging initialization for pg2json.
//!
//! Wraps the observability crate so every entry point logs the same way:
//! structured JSONL to `~/.pg2json/logs/pg2json.jsonl`, with the level taken
//! from `RUST_LOG` when set and from configuration otherwise.

use crate::{CoreError, CoreResult};
use std::path::Path;

const SERVICE_NAME: &str = "pg2json";

/// Initialize the logging system.
///
/// * `level` - default level (trace, debug, info, warn, error)
/// * `log_path` - JSONL file to append to
/// * `also_stderr` - mirror entries to stderr in compact form
pub fn init_logging(level: &str, log_path: &Path, also_stderr: bool) -> CoreResult<()> {
    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path: Some(log_path.to_path_buf()),
        also_stderr,
    })
    .map_err(|e| CoreError::Config(format!("open log file {}: {e}", log_path.display())))
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_and_whitespace_insensitive() {
        assert_eq!(parse_level(" Debug "), tracing::Level::DEBUG);
        assert_eq!(parse_level("WARNING"), tracing::Level::WARN);
    }

    #[test]
    fn parse_level_unknown_defaults_to_info() {
        assert_eq!(parse_level(""), tracing::Level::INFO);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
    }

    #[test]
    fn init_logging_writes_to_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("pg2json.jsonl");

        init_logging("debug", &path, false).unwrap();

        assert!(path.exists());
    }
}
