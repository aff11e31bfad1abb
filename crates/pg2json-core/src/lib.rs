//! pg2json core: credential sessions over PostgreSQL.
//!
//! [`DatabaseService`] implements the caller-facing operations:
//!
//! - `test_connection`: connect and disconnect, nothing stored
//! - `open_session`: verify connectivity, mint a session key, store the
//!   connection parameters encrypted under the caller's secret
//! - `list_tables` / `fetch_as_json`: decrypt a session and use it
//! - `close_session`: drop a session before its TTL
//!
//! All capabilities (gateway, store, codec, key hasher) are injected through
//! [`ServiceOptions`]; nothing here is process-global.

mod error;
mod service;

#[cfg(test)]
mod tests;

pub use error::{DomainError, ServiceError, ServiceResult, INTERNAL_ERROR_MESSAGE};
pub use service::{parse_session_duration, render_json_array, DatabaseService, ServiceOptions};
