//! Process-local room store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::{Fields, RoomStore, StoreError};

/// A [`RoomStore`] backed by a `HashMap` behind an async mutex.
///
/// Cloning shares the same map. [`set_available`](Self::set_available)
/// simulates an outage: while unavailable every call fails with
/// [`StoreError::Unavailable`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    hashes: Arc<Mutex<HashMap<String, Fields>>>,
    available: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty, reachable store.
    pub fn new() -> Self {
        Self {
            hashes: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Switches the simulated connection on or off.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored hashes.
    pub async fn len(&self) -> usize {
        self.hashes.lock().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.hashes.lock().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".into()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore for MemoryStore {
    async fn hash_set(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut hashes = self.hashes.lock().await;
        hashes.entry(key.to_string()).or_default().extend(fields);
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<Fields, StoreError> {
        self.check_available()?;
        let hashes = self.hashes.lock().await;
        match hashes.get(key) {
            Some(fields) if !fields.is_empty() => Ok(fields.clone()),
            _ => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.hashes.lock().await.remove(key);
        Ok(())
    }
}
