//! Storage trait definitions.

use crate::StoreResult;
use async_trait::async_trait;
use std::time::Duration;

/// TTL-keyed storage backend for session ciphertext.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `value` under `key` for `ttl`, replacing any existing entry.
    ///
    /// A zero `ttl` leaves the key absent.
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()>;

    /// Read the live value for `key`.
    ///
    /// Returns [`crate::StoreError::NotFound`] when the key was never written,
    /// was deleted, or has expired.
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}
