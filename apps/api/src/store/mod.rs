//! Job Store: keyed persistence with per-entry expiry.
//!
//! `StoreBackend` is the raw string key/value seam (Redis in production, an
//! in-process map for local runs and tests). `JobStore` layers job keys,
//! JSON encoding and the retention window on top of it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::job::{JobId, JobRecord};

pub mod memory;
pub mod redis;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("{0}")]
    Unavailable(String),

    #[error("failed to encode job record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("stored job record is corrupt: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Raw key/value store with TTL. Implementations must be safe to share
/// across request handlers and workers.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value, and expires
    /// it after `ttl`.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Returns the live value for `key`. Expired and never-written keys are
    /// both `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// No-op round trip to check reachability.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Typed job persistence shared by the dispatcher, workers and handlers.
#[derive(Clone)]
pub struct JobStore {
    backend: Arc<dyn StoreBackend>,
    ttl: Duration,
}

impl JobStore {
    pub fn new(backend: Arc<dyn StoreBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Writes the full record, resetting its expiry to the retention window.
    pub async fn put(&self, id: &JobId, record: &JobRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record).map_err(StoreError::Encode)?;
        self.backend.put(&id.store_key(), value, self.ttl).await
    }

    pub async fn get(&self, id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        match self.backend.get(&id.store_key()).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(StoreError::Decode),
            None => Ok(None),
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.ping().await
    }
}
