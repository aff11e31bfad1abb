//! In-process session store.

use crate::{SessionStore, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory [`SessionStore`] with wall-clock expiry.
///
/// Expired entries are dropped lazily on read; there is no sweeper.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        let mut entries = self.entries.lock();
        if ttl.is_zero() {
            entries.remove(key);
            return Ok(());
        }

        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Write(format!("ttl out of range: {ttl:?}")))?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                Err(StoreError::NotFound(key.to_string()))
            }
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
