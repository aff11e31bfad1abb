//! Session storage for pg2json.
//!
//! A session store holds opaque ciphertext blobs keyed by session key, each
//! with a time-to-live. Expiry is owned entirely by the store; callers never
//! sweep. "Never written", "deleted" and "expired" all read back as
//! [`StoreError::NotFound`].
//!
//! Implementations:
//! - [`RedisSessionStore`]: production backend (`SET .. PX`, `GET`, `DEL`)
//! - [`MemorySessionStore`]: in-process backend for tests and local runs

mod memory;
mod redis_store;
mod traits;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;
pub use traits::SessionStore;

use thiserror::Error;

/// Error type for session store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No live entry exists for the key.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Write or delete was rejected by the backend.
    #[error("Store write error: {0}")]
    Write(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for session store operations.
pub type StoreResult<T> = Result<T, StoreError>;
