//! Connect-time error classification.
//!
//! Structured driver codes (SQLSTATE) are checked first; network failures
//! fall back to the I/O error kind and then to substring inspection of the
//! error text. Anything that matches no rule stays unclassified.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use tokio_postgres::error::SqlState;

/// Marker PostgreSQL puts in the message when pg_hba.conf rejects the client.
const NO_HBA_ENTRY: &str = "no pg_hba.conf entry for host";

/// Resolver phrasings for an unknown host name across platforms.
const UNKNOWN_HOST_MARKERS: &[&str] = &[
    "no such host",
    "name or service not known",
    "nodename nor servname provided",
    "no address associated with hostname",
    "no such host is known",
];

const CONNECTION_REFUSED: &str = "connection refused";

/// Caller-actionable reasons a connect attempt can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionErrorKind {
    DatabaseDoesNotExist,
    InvalidUsername,
    InvalidHost,
    InvalidPort,
    NoAccess,
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::DatabaseDoesNotExist => "database does not exist",
            Self::InvalidUsername => "invalid username",
            Self::InvalidHost => "invalid host",
            Self::InvalidPort => "invalid port",
            Self::NoAccess => "no access from this host",
        };
        f.write_str(text)
    }
}

/// What the classifier gets to look at for one failed connect attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectFailure {
    /// Five-character SQLSTATE reported by the server, if any.
    pub sql_state: Option<String>,
    /// Driver message, or the rendered network error chain.
    pub message: String,
    /// Kind of the innermost I/O error, if the failure was network-level.
    pub io_kind: Option<io::ErrorKind>,
}

impl ConnectFailure {
    /// A failure reported by the server with a SQLSTATE code.
    pub fn driver(sql_state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sql_state: Some(sql_state.into()),
            message: message.into(),
            io_kind: None,
        }
    }

    /// A failure below the protocol layer.
    pub fn network(io_kind: Option<io::ErrorKind>, message: impl Into<String>) -> Self {
        Self {
            sql_state: None,
            message: message.into(),
            io_kind,
        }
    }

    /// Capture what the classifier needs from a tokio-postgres error.
    pub fn from_postgres(err: &tokio_postgres::Error) -> Self {
        if let Some(db) = err.as_db_error() {
            return Self::driver(db.code().code(), db.message());
        }

        Self::network(io_kind_of(err), render_chain(err))
    }
}

/// Classify a failed connect attempt.
pub fn classify(failure: &ConnectFailure) -> Option<ConnectionErrorKind> {
    if let Some(code) = failure.sql_state.as_deref() {
        if code == SqlState::INVALID_CATALOG_NAME.code() {
            return Some(ConnectionErrorKind::DatabaseDoesNotExist);
        }
        if code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION.code() {
            if failure.message.contains(NO_HBA_ENTRY) {
                return Some(ConnectionErrorKind::NoAccess);
            }
            return Some(ConnectionErrorKind::InvalidUsername);
        }
        return None;
    }

    let message = failure.message.to_lowercase();

    if UNKNOWN_HOST_MARKERS.iter().any(|m| message.contains(m)) {
        return Some(ConnectionErrorKind::InvalidHost);
    }
    if failure.io_kind == Some(io::ErrorKind::ConnectionRefused)
        || message.contains(CONNECTION_REFUSED)
    {
        return Some(ConnectionErrorKind::InvalidPort);
    }

    None
}

fn io_kind_of(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    let mut kind = None;
    while let Some(current) = source {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            kind = Some(io_err.kind());
        }
        source = current.source();
    }
    kind
}

fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(current) = source {
        rendered.push_str(": ");
        rendered.push_str(&current.to_string());
        source = current.source();
    }
    rendered
}
