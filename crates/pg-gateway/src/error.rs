//! Gateway error types.

use crate::ConnectionErrorKind;
use thiserror::Error;

/// Gateway error type.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Connect attempt failed for a recognised, caller-actionable reason.
    #[error("Connection rejected: {0}")]
    Classified(ConnectionErrorKind),

    /// Connect attempt failed for any other reason.
    #[error("Connection error: {0}")]
    Connect(String),

    /// TLS client setup failed before connecting.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Closing the connection failed.
    #[error("Close error: {0}")]
    Close(String),

    /// Query execution failed.
    #[error("Query error: {0}")]
    Query(String),
}

/// Result type alias using GatewayError.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A required input field was missing or empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} is required")]
pub struct ValidationError {
    pub field: &'static str,
}

impl ValidationError {
    pub(crate) fn missing(field: &'static str) -> Self {
        Self { field }
    }
}
