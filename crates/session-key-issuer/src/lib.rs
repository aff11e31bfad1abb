//! Session key minting.
//!
//! A session key is the bcrypt hash of a freshly generated UUIDv4. The hash,
//! not the UUID, is what callers see and what the session store is keyed by;
//! the UUID is discarded immediately. Hashing is deliberately slow so that
//! guessing live keys is expensive.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Default bcrypt cost for session keys.
pub const DEFAULT_KEY_COST: u32 = 14;

/// Errors raised while minting a session key.
#[derive(Debug, Error)]
pub enum KeyIssuerError {
    /// The underlying hasher failed.
    #[error("Hashing error: {0}")]
    Hashing(String),

    /// The blocking hashing task panicked or was cancelled.
    #[error("Task join error: {0}")]
    Join(String),
}

/// Result type for key issuing.
pub type KeyIssuerResult<T> = Result<T, KeyIssuerError>;

/// One-way, salted hash used to turn identifiers into session keys.
pub trait KeyHasher: Send + Sync {
    /// Hash `value`. Output must differ for distinct inputs with
    /// overwhelming probability.
    fn hash(&self, value: &str) -> KeyIssuerResult<String>;
}

/// Bcrypt-backed [`KeyHasher`].
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Create a hasher with an explicit cost (valid range 4..=31).
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_COST)
    }
}

impl KeyHasher for BcryptHasher {
    fn hash(&self, value: &str) -> KeyIssuerResult<String> {
        bcrypt::hash(value, self.cost).map_err(|e| KeyIssuerError::Hashing(e.to_string()))
    }
}

/// Mints opaque session keys.
#[derive(Clone)]
pub struct SessionKeyIssuer {
    hasher: Arc<dyn KeyHasher>,
}

impl SessionKeyIssuer {
    pub fn new(hasher: Arc<dyn KeyHasher>) -> Self {
        Self { hasher }
    }

    /// Issue a new session key.
    ///
    /// Runs the hasher on the blocking pool since bcrypt is CPU-bound.
    pub async fn issue_key(&self) -> KeyIssuerResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let identifier = Uuid::new_v4().to_string();

        let key = tokio::task::spawn_blocking(move || hasher.hash(&identifier))
            .await
            .map_err(|e| KeyIssuerError::Join(e.to_string()))??;

        debug!("issued session key");
        Ok(key)
    }
}
