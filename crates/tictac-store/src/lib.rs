//! Room persistence for tictac.
//!
//! Rooms live in an external key/hash store: one hash per room, keyed by
//! the room id, with one string field per [`Room`](tictac_protocol::Room)
//! attribute. This crate defines that contract ([`RoomStore`]), the
//! mapping between a hash and the typed record ([`room_to_fields`],
//! [`room_from_fields`]), and two backends:
//!
//! - [`MemoryStore`]: a process-local map, used by tests and when no
//!   Redis URL is configured
//! - [`RedisStore`]: `HSET` / `HGETALL` / `DEL` over a managed Redis
//!   connection (feature `redis`)
//!
//! # Feature Flags
//!
//! - `redis`: enables [`RedisStore`]

mod error;
mod memory;
mod record;
#[cfg(feature = "redis")]
mod redis_store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{FIELD_NAMES, room_from_fields, room_to_fields};
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

use std::collections::HashMap;
use std::future::Future;

/// The fields of one stored hash.
pub type Fields = HashMap<String, String>;

/// An atomic key/hash-field store holding room records.
///
/// Each call is a single round trip and is atomic on its own; nothing
/// here spans calls. The futures are `Send` so a store can be used from
/// spawned tasks and axum handlers.
pub trait RoomStore: Send + Sync + 'static {
    /// Sets every given field on the hash at `key`, creating it if needed.
    /// Fields not named are left as they are.
    fn hash_set(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads every field of the hash at `key`.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if the hash does not exist.
    fn hash_get_all(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Fields, StoreError>> + Send;

    /// Removes the hash at `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}
