//! In-process TTL store. Selected with `STORE_BACKEND=memory`; state does not
//! survive a restart and is not shared between processes.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{StoreBackend, StoreError};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(poisoned)?;
        // Expired entries are only ever dropped here.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let _entries = self.entries.read().map_err(poisoned)?;
        Ok(())
    }
}
