//! Service error types.
//!
//! Two tiers: [`DomainError`] is the closed set of outcomes a caller can act
//! on; every other [`ServiceError`] variant is an internal failure whose
//! detail is logged but not shown to the caller by default.

use credential_crypto::CredentialCryptoError;
use pg_gateway::{ConnectionErrorKind, GatewayError, ValidationError};
use session_key_issuer::KeyIssuerError;
use session_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Message shown for internal failures when details are withheld.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Caller-actionable failures, each with a fixed message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainError {
    #[error("The entered database does not exist. Please verify the database name and try again")]
    DatabaseDoesNotExist,

    #[error("Invalid username. Please check and try again.")]
    InvalidUsername,

    #[error("Invalid database host. Please check and try again.")]
    InvalidHost,

    #[error("Invalid port number. Please check and try again.")]
    InvalidPort,

    #[error("Access denied. Please verify your credentials and connection settings")]
    NoAccess,

    #[error("Connection session time expired")]
    SessionExpired,
}

impl From<ConnectionErrorKind> for DomainError {
    fn from(kind: ConnectionErrorKind) -> Self {
        match kind {
            ConnectionErrorKind::DatabaseDoesNotExist => Self::DatabaseDoesNotExist,
            ConnectionErrorKind::InvalidUsername => Self::InvalidUsername,
            ConnectionErrorKind::InvalidHost => Self::InvalidHost,
            ConnectionErrorKind::InvalidPort => Self::InvalidPort,
            ConnectionErrorKind::NoAccess => Self::NoAccess,
        }
    }
}

/// Error type for [`crate::DatabaseService`] operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A required input was missing or empty.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid session duration {input:?}: {reason}")]
    InvalidSessionDuration { input: String, reason: String },

    #[error("Credential crypto error: {0}")]
    Crypto(#[from] CredentialCryptoError),

    #[error("Session key error: {0}")]
    KeyIssuer(#[from] KeyIssuerError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// Unclassified gateway failure. Classified connect failures become
    /// [`ServiceError::Domain`] instead.
    #[error("Database error: {0}")]
    Gateway(GatewayError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timed out during {step} (deadline {timeout:?})")]
    Timeout { step: &'static str, timeout: Duration },
}

impl ServiceError {
    /// Whether the caller caused this error and can fix it.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Domain(_) | Self::InvalidInput(_))
    }

    pub fn domain(&self) -> Option<DomainError> {
        match self {
            Self::Domain(e) => Some(*e),
            _ => None,
        }
    }

    /// Text safe to return to the caller.
    ///
    /// Client errors always carry their message; internal failures are
    /// replaced by [`INTERNAL_ERROR_MESSAGE`] unless `send_details` is set.
    pub fn public_message(&self, send_details: bool) -> String {
        if self.is_client_error() || send_details {
            self.to_string()
        } else {
            INTERNAL_ERROR_MESSAGE.to_string()
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Classified(kind) => Self::Domain(kind.into()),
            other => Self::Gateway(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type alias using ServiceError.
pub type ServiceResult<T> = Result<T, ServiceError>;
