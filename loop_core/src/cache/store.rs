//! The persisted store boundary - a namespaced byte-string key-value store.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Why a store write failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store is out of room; the cache reacts by evicting half of its
    /// entries and retrying once.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Any other storage failure.
    #[error("storage failure: {0}")]
    Other(String),
}

/// A key-value byte store the cache persists into.
///
/// Implementations are expected to be cheap to call and tolerant of
/// last-writer-wins races; the cache reads once at startup and writes after
/// each mutation.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the bytes stored under `key`, if any.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Write `value` under `key`.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Delete whatever is stored under `key`.
    async fn remove(&self, key: &str);
}

/// An in-process store backed by a hash map.
///
/// The default store for shells without durable storage, and the test double
/// for quota handling via `with_capacity_limit`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    capacity_limit: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects any value larger than `bytes`.
    pub fn with_capacity_limit(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity_limit: Some(bytes),
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if let Some(limit) = self.capacity_limit {
            if value.len() > limit {
                return Err(StoreError::QuotaExceeded);
            }
        }
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}
