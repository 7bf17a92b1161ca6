//! The connection registry: which live connections belong to which room.
//!
//! One map, one lock. Admission, removal and the snapshot taken for a
//! broadcast all go through the same mutex, so a disconnect can never
//! interleave with a broadcast walking the same set. Sends themselves
//! happen outside the lock, so one slow client does not stall every
//! other room.

use std::collections::HashMap;
use std::sync::Arc;

use tictac_protocol::RoomId;
use tictac_transport::{Connection, ConnectionId};
use tokio::sync::Mutex;

use crate::SessionError;

/// Maximum number of live connections per room.
pub const ROOM_CAPACITY: usize = 2;

/// The live side of one room.
struct RoomConnections<C> {
    conns: Vec<Arc<C>>,
    /// Held by the session loop around one move's
    /// read-validate-apply-persist-broadcast.
    move_lock: Arc<Mutex<()>>,
}

impl<C> RoomConnections<C> {
    fn new() -> Self {
        Self {
            conns: Vec::with_capacity(ROOM_CAPACITY),
            move_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Live connections grouped by room, at most [`ROOM_CAPACITY`] per room.
///
/// Rooms with no connections are evicted immediately, so the registry
/// never holds empty entries. Connections are shared as `Arc<C>`: the
/// session task driving a connection keeps its own handle for `recv`.
///
/// ```text
/// try_register ──→ [room: conn-1]  ──try_register──→ [room: conn-1, conn-2]
///                        ↑                                   │
///                        └────────unregister(conn-2)─────────┘
///                                 unregister(conn-1) ──→ (room evicted)
/// ```
pub struct ConnectionRegistry<C> {
    rooms: Mutex<HashMap<RoomId, RoomConnections<C>>>,
}

impl<C: Connection> ConnectionRegistry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Admits `conn` into `room_id`.
    ///
    /// # Errors
    /// [`SessionError::RoomFull`] if the room already holds
    /// [`ROOM_CAPACITY`] connections. The connection is left untouched
    /// (the caller decides how to turn it away).
    pub async fn try_register(
        &self,
        room_id: &RoomId,
        conn: Arc<C>,
    ) -> Result<(), SessionError> {
        let mut rooms = self.rooms.lock().await;
        let entry = rooms
            .entry(room_id.clone())
            .or_insert_with(RoomConnections::new);
        if entry.conns.len() >= ROOM_CAPACITY {
            tracing::warn!(%room_id, conn_id = %conn.id(), "room already has two live connections");
            return Err(SessionError::RoomFull(room_id.clone()));
        }
        tracing::info!(%room_id, conn_id = %conn.id(), "connection registered");
        entry.conns.push(conn);
        Ok(())
    }

    /// Removes one connection and closes it. Evicts the room once it has
    /// no connections left.
    ///
    /// Returns `false` if the connection was not registered (already
    /// removed by a failed broadcast, or by [`close_all`](Self::close_all)).
    pub async fn unregister(&self, room_id: &RoomId, conn_id: ConnectionId) -> bool {
        let removed = {
            let mut rooms = self.rooms.lock().await;
            let Some(entry) = rooms.get_mut(room_id) else {
                return false;
            };
            let removed = entry
                .conns
                .iter()
                .position(|c| c.id() == conn_id)
                .map(|idx| entry.conns.remove(idx));
            if entry.conns.is_empty() {
                rooms.remove(room_id);
                tracing::info!(%room_id, "all connections closed, room evicted");
            }
            removed
        };

        match removed {
            Some(conn) => {
                close_quietly(room_id, conn.as_ref()).await;
                tracing::info!(%room_id, %conn_id, "connection unregistered");
                true
            }
            None => false,
        }
    }

    /// Sends `payload` to every connection in the room.
    ///
    /// A connection whose send fails is dropped from the room and closed;
    /// it is not retried. Returns how many connections received the
    /// payload.
    pub async fn broadcast(&self, room_id: &RoomId, payload: &[u8]) -> usize {
        let targets = self.snapshot(room_id).await;
        if targets.is_empty() {
            tracing::warn!(%room_id, "no live connections to broadcast to");
            return 0;
        }
        self.deliver(room_id, targets, payload).await
    }

    /// Sends `payload` to one connection in the room, with the same
    /// drop-on-failure rule as [`broadcast`](Self::broadcast). Returns
    /// `true` if it was delivered.
    pub async fn send_to(
        &self,
        room_id: &RoomId,
        conn_id: ConnectionId,
        payload: &[u8],
    ) -> bool {
        let targets: Vec<_> = self
            .snapshot(room_id)
            .await
            .into_iter()
            .filter(|c| c.id() == conn_id)
            .collect();
        self.deliver(room_id, targets, payload).await == 1
    }

    /// The room's move lock, if the room has live connections.
    pub async fn move_lock(&self, room_id: &RoomId) -> Option<Arc<Mutex<()>>> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .map(|entry| Arc::clone(&entry.move_lock))
    }

    /// Number of live connections in one room.
    pub async fn connection_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .map_or(0, |entry| entry.conns.len())
    }

    /// Number of rooms with at least one live connection.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Drops and closes every connection in every room.
    pub async fn close_all(&self) {
        let drained: Vec<(RoomId, RoomConnections<C>)> =
            self.rooms.lock().await.drain().collect();
        for (room_id, entry) in drained {
            for conn in entry.conns {
                close_quietly(&room_id, conn.as_ref()).await;
            }
        }
    }

    async fn snapshot(&self, room_id: &RoomId) -> Vec<Arc<C>> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .map(|entry| entry.conns.clone())
            .unwrap_or_default()
    }

    async fn deliver(&self, room_id: &RoomId, targets: Vec<Arc<C>>, payload: &[u8]) -> usize {
        let mut delivered = 0;
        let mut failed = Vec::new();
        for conn in targets {
            match conn.send(payload).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(%room_id, conn_id = %conn.id(), error = %e, "send failed, dropping connection");
                    failed.push(conn.id());
                }
            }
        }
        for conn_id in failed {
            self.unregister(room_id, conn_id).await;
        }
        delivered
    }
}

impl<C: Connection> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

async fn close_quietly<C: Connection>(room_id: &RoomId, conn: &C) {
    if let Err(e) = conn.close().await {
        tracing::debug!(%room_id, conn_id = %conn.id(), error = %e, "close failed");
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Registry behaviour, driven with in-memory connection pairs so both
    //! ends are observable.

    use super::*;
    use tictac_transport::{MemoryConnection, MemoryPeer};

    fn room(id: &str) -> RoomId {
        RoomId::from(id)
    }

    fn conn() -> (Arc<MemoryConnection>, MemoryPeer) {
        let (conn, peer) = MemoryConnection::pair("/ws/test");
        (Arc::new(conn), peer)
    }

    #[tokio::test]
    async fn test_try_register_third_connection_is_room_full() {
        let registry = ConnectionRegistry::new();
        let r = room("room-1");
        let (a, _pa) = conn();
        let (b, _pb) = conn();
        let (c, _pc) = conn();

        registry.try_register(&r, a).await.unwrap();
        registry.try_register(&r, b).await.unwrap();
        let err = registry.try_register(&r, Arc::clone(&c)).await.unwrap_err();

        assert_eq!(err, SessionError::RoomFull(r.clone()));
        assert_eq!(registry.connection_count(&r).await, ROOM_CAPACITY);
        assert!(!c.is_closed(), "a refused connection is left to the caller");
    }

    #[tokio::test]
    async fn test_rooms_have_independent_capacity() {
        let registry = ConnectionRegistry::new();
        for id in ["room-a", "room-b"] {
            for _ in 0..ROOM_CAPACITY {
                let (c, _p) = conn();
                registry.try_register(&room(id), c).await.unwrap();
            }
        }
        assert_eq!(registry.room_count().await, 2);
    }

    #[tokio::test]
    async fn test_unregister_removes_only_that_connection() {
        let registry = ConnectionRegistry::new();
        let r = room("room-1");
        let (a, _pa) = conn();
        let (b, _pb) = conn();
        registry.try_register(&r, Arc::clone(&a)).await.unwrap();
        registry.try_register(&r, Arc::clone(&b)).await.unwrap();

        assert!(registry.unregister(&r, a.id()).await);
        assert!(a.is_closed());
        assert!(!b.is_closed());
        assert_eq!(registry.connection_count(&r).await, 1);
        assert_eq!(registry.room_count().await, 1);

        assert!(registry.unregister(&r, b.id()).await);
        assert_eq!(registry.room_count().await, 0, "empty room is evicted");
    }

    #[tokio::test]
    async fn test_unregister_unknown_connection_is_noop() {
        let registry = ConnectionRegistry::<MemoryConnection>::new();
        assert!(!registry.unregister(&room("room-1"), ConnectionId::new(999)).await);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_connection() {
        let registry = ConnectionRegistry::new();
        let r = room("room-1");
        let (a, mut pa) = conn();
        let (b, mut pb) = conn();
        registry.try_register(&r, a).await.unwrap();
        registry.try_register(&r, b).await.unwrap();

        assert_eq!(registry.broadcast(&r, b"hello").await, 2);
        assert_eq!(pa.recv().await.unwrap(), b"hello");
        assert_eq!(pb.recv().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_broadcast_drops_and_closes_failed_connection() {
        let registry = ConnectionRegistry::new();
        let r = room("room-1");
        let (a, mut pa) = conn();
        let (b, mut pb) = conn();
        registry.try_register(&r, Arc::clone(&a)).await.unwrap();
        registry.try_register(&r, Arc::clone(&b)).await.unwrap();

        pb.refuse_incoming();
        assert_eq!(registry.broadcast(&r, b"update").await, 1);

        assert_eq!(pa.recv().await.unwrap(), b"update");
        assert!(b.is_closed());
        assert_eq!(registry.connection_count(&r).await, 1);

        // The freed slot can be taken again.
        let (c, _pc) = conn();
        registry.try_register(&r, c).await.unwrap();
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_room_sends_nothing() {
        let registry = ConnectionRegistry::<MemoryConnection>::new();
        assert_eq!(registry.broadcast(&room("room-x"), b"x").await, 0);
    }

    #[tokio::test]
    async fn test_send_to_targets_one_connection() {
        let registry = ConnectionRegistry::new();
        let r = room("room-1");
        let (a, mut pa) = conn();
        let (b, mut pb) = conn();
        registry.try_register(&r, Arc::clone(&a)).await.unwrap();
        registry.try_register(&r, b).await.unwrap();

        assert!(registry.send_to(&r, a.id(), b"just you").await);
        assert_eq!(pa.recv().await.unwrap(), b"just you");
        assert!(pb.try_recv().is_none());

        assert!(!registry.send_to(&r, ConnectionId::new(12345), b"nobody").await);
    }

    #[tokio::test]
    async fn test_move_lock_is_shared_per_room() {
        let registry = ConnectionRegistry::new();
        let r = room("room-1");
        assert!(registry.move_lock(&r).await.is_none());

        let (a, _pa) = conn();
        registry.try_register(&r, a).await.unwrap();
        let first = registry.move_lock(&r).await.unwrap();
        let second = registry.move_lock(&r).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let _held = first.lock().await;
        assert!(second.try_lock().is_err());
    }

    #[tokio::test]
    async fn test_close_all_empties_registry() {
        let registry = ConnectionRegistry::new();
        let (a, _pa) = conn();
        let (b, _pb) = conn();
        registry.try_register(&room("room-a"), Arc::clone(&a)).await.unwrap();
        registry.try_register(&room("room-b"), Arc::clone(&b)).await.unwrap();

        registry.close_all().await;

        assert_eq!(registry.room_count().await, 0);
        assert!(a.is_closed());
        assert!(b.is_closed());
    }
}
