//! File system paths for pg2json.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "pg2json.jsonl";

/// Manages file system paths (`~/.pg2json` by default).
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Create a Paths instance rooted at `~/.pg2json`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".pg2json"),
        })
    }

    /// Create a Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.pg2json).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.pg2json/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the logs directory (~/.pg2json/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the structured log file (~/.pg2json/logs/pg2json.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let base = PathBuf::from("/tmp/test-pg2json");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), &base);
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.logs_dir(), base.join("logs"));
        assert_eq!(paths.log_file(), base.join("logs/pg2json.jsonl"));
    }

    #[test]
    fn test_paths_default() {
        let paths = Paths::new().unwrap();
        let home = dirs::home_dir().unwrap();

        assert_eq!(paths.base_dir(), &home.join(".pg2json"));
    }

    #[test]
    fn test_ensure_dirs_creates_directories() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("pg2json");
        let paths = Paths::with_base_dir(base.clone());

        assert!(!base.exists());

        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();

        assert!(base.is_dir());
        assert!(paths.logs_dir().is_dir());
    }
}
