//! Configuration management for pg2json.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default Redis URL for the session store.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

/// Default per-operation deadline.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Default driver-level connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default bcrypt cost for session keys.
pub const DEFAULT_SESSION_KEY_COST: u32 = 14;

/// Largest accepted operation or connect timeout (one day).
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

const MIN_SESSION_KEY_COST: u32 = 4;
const MAX_SESSION_KEY_COST: u32 = 31;

/// Main pg2json configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Redis URL of the session store.
    pub redis_url: String,
    /// Deadline applied to every operation, in seconds.
    pub operation_timeout_secs: u64,
    /// Driver-level connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// bcrypt cost used when minting session keys.
    pub session_key_cost: u32,
    /// Whether internal error details are shown to the caller.
    pub send_details_on_internal_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            session_key_cost: DEFAULT_SESSION_KEY_COST,
            send_details_on_internal_error: false,
        }
    }
}

impl Config {
    /// Load configuration from `paths`, falling back to defaults, then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from variables resolved through `lookup`.
    ///
    /// `load` passes `std::env::var`; tests pass a map.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(level) = var("PG2JSON_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = var("REDIS_URL") {
            self.redis_url = url;
        }
        if let Some(raw) = var("PG2JSON_OPERATION_TIMEOUT_SECS") {
            self.operation_timeout_secs = parse_var("PG2JSON_OPERATION_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = var("PG2JSON_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = parse_var("PG2JSON_CONNECT_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = var("PG2JSON_SESSION_KEY_COST") {
            self.session_key_cost = parse_var("PG2JSON_SESSION_KEY_COST", &raw)?;
        }
        if let Some(raw) = var("PG2JSON_SEND_DETAILS_ON_INTERNAL_ERROR") {
            self.send_details_on_internal_error =
                parse_var("PG2JSON_SEND_DETAILS_ON_INTERNAL_ERROR", &raw)?;
        }
        Ok(())
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        check_timeout("operation_timeout_secs", self.operation_timeout_secs)?;
        check_timeout("connect_timeout_secs", self.connect_timeout_secs)?;
        if !(MIN_SESSION_KEY_COST..=MAX_SESSION_KEY_COST).contains(&self.session_key_cost) {
            return Err(CoreError::Config(format!(
                "session_key_cost must be between {MIN_SESSION_KEY_COST} and {MAX_SESSION_KEY_COST}, got {}",
                self.session_key_cost
            )));
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> CoreResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("invalid value for {name}: {raw:?}")))
}

fn check_timeout(name: &str, secs: u64) -> CoreResult<()> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(CoreError::Config(format!(
            "{name} must be between 1 and {MAX_TIMEOUT_SECS}, got {secs}"
        )));
    }
    Ok(())
}
