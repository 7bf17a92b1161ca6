//! Redis-backed room store.

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::{Fields, RoomStore, StoreError};

/// A [`RoomStore`] over a Redis server.
///
/// Holds a [`ConnectionManager`], which reconnects on its own after a
/// dropped connection. Each call clones the manager (a cheap handle) so
/// concurrent callers do not queue behind one another.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to `redis_url`
    /// (e.g. `redis://127.0.0.1:6379/0`).
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] if the URL is invalid or the first
    /// connection attempt fails.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {e}")))?;
        let manager = ConnectionManager::new(client).await?;
        tracing::info!("connected to redis room store");
        Ok(Self { manager })
    }
}

impl RoomStore for RedisStore {
    async fn hash_set(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
    ) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        conn.hset_multiple::<_, _, _, ()>(key, fields.as_slice())
            .await
            .map_err(|e| {
                tracing::error!(key, error = %e, "HSET failed");
                StoreError::from(e)
            })
    }

    async fn hash_get_all(&self, key: &str) -> Result<Fields, StoreError> {
        let mut conn = self.manager.clone();
        let fields: Fields = conn.hgetall(key).await.map_err(|e| {
            tracing::error!(key, error = %e, "HGETALL failed");
            StoreError::from(e)
        })?;
        if fields.is_empty() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(fields)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await.map_err(|e| {
            tracing::error!(key, error = %e, "DEL failed");
            StoreError::from(e)
        })
    }
}
