//! Configuration, filesystem paths and logging bootstrap for pg2json.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOG_LEVEL, DEFAULT_OPERATION_TIMEOUT_SECS,
    DEFAULT_REDIS_URL, DEFAULT_SESSION_KEY_COST, MAX_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
