//! Per-connection session loop: admission, initial snapshot, and moves.
//!
//! Each accepted WebSocket connection gets its own Tokio task running
//! [`SessionCoordinator::handle_connection`]. The flow is:
//!   1. Read the room id from the upgrade path, load the room, require
//!      `started`, and admit the connection into the registry
//!   2. Push an `initial_state` snapshot
//!   3. Loop: receive frames → apply `make_move` → broadcast `update`
//!   4. On disconnect, error or shutdown, unregister (always)

use std::sync::Arc;

use tictac_engine::{Outcome, apply_move, next_player, outcome, parse_position};
use tictac_protocol::{ClientFrame, Codec, JsonCodec, Room, RoomId, RoomStatus, ServerMessage};
use tictac_room::{RoomError, RoomService};
use tictac_session::{ConnectionRegistry, ErrorScope, SessionConfig, SessionError, SessionState};
use tictac_store::RoomStore;
use tictac_transport::{Connection, ConnectionId, TransportError};
use tokio::sync::watch;

use crate::{MoveError, TictacError};

/// Path prefix of the live session endpoint: `/ws/{room_id}`.
pub const WS_PATH_PREFIX: &str = "/ws/";

/// Drives live play for every connection of one server.
///
/// Shared as `Arc<SessionCoordinator<..>>` by all connection tasks. It
/// owns the [`ConnectionRegistry`] and a shutdown signal that ends every
/// session loop at once.
pub struct SessionCoordinator<S, C, K = JsonCodec> {
    rooms: Arc<RoomService<S>>,
    registry: ConnectionRegistry<C>,
    codec: K,
    config: SessionConfig,
    shutdown: watch::Sender<bool>,
}

/// Unregisters a connection when the session ends.
///
/// The normal exit paths call [`release`](Self::release). If the task is
/// aborted or panics instead, `Drop` spawns the same cleanup so the slot
/// is never leaked.
struct RegistrationGuard<S: RoomStore, C: Connection, K: Codec> {
    coordinator: Arc<SessionCoordinator<S, C, K>>,
    room_id: RoomId,
    conn_id: ConnectionId,
    armed: bool,
}

impl<S: RoomStore, C: Connection, K: Codec> RegistrationGuard<S, C, K> {
    async fn release(mut self) {
        self.armed = false;
        self.coordinator
            .registry
            .unregister(&self.room_id, self.conn_id)
            .await;
    }
}

impl<S: RoomStore, C: Connection, K: Codec> Drop for RegistrationGuard<S, C, K> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let coordinator = Arc::clone(&self.coordinator);
        let room_id = self.room_id.clone();
        let conn_id = self.conn_id;
        handle.spawn(async move {
            coordinator.registry.unregister(&room_id, conn_id).await;
        });
    }
}

impl<S, C, K> SessionCoordinator<S, C, K>
where
    S: RoomStore,
    C: Connection,
    K: Codec,
{
    /// Creates a coordinator over the shared room service.
    pub fn new(rooms: Arc<RoomService<S>>, codec: K, config: SessionConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            rooms,
            registry: ConnectionRegistry::new(),
            codec,
            config,
            shutdown,
        }
    }

    /// The live connection registry.
    pub fn registry(&self) -> &ConnectionRegistry<C> {
        &self.registry
    }

    /// The room service moves are committed through.
    pub fn rooms(&self) -> &Arc<RoomService<S>> {
        &self.rooms
    }

    /// Ends every session loop and closes every registered connection.
    /// Sessions admitted afterwards end immediately.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        self.registry.close_all().await;
    }

    /// Handles a single connection from upgrade to close.
    ///
    /// Returns `Err` only when the connection was refused or its
    /// snapshot could not be delivered; a session that ran and ended is
    /// `Ok`.
    pub async fn handle_connection(self: Arc<Self>, conn: C) -> Result<(), TictacError> {
        let conn = Arc::new(conn);
        let conn_id = conn.id();
        let state = SessionState::Connecting;
        tracing::debug!(%conn_id, path = conn.path(), "handling new connection");

        // --- Step 1: Admission ---
        let (room_id, room) = match self.admit(&conn).await {
            Ok(admitted) => admitted,
            Err(e) => {
                tracing::info!(%conn_id, path = conn.path(), error = %e, "connection rejected");
                self.reject(conn.as_ref(), &e).await;
                return Err(e);
            }
        };
        let guard = RegistrationGuard {
            coordinator: Arc::clone(&self),
            room_id: room_id.clone(),
            conn_id,
            armed: true,
        };
        let state = state.transition(SessionState::Registered)?;

        // --- Step 2: Initial snapshot ---
        if let Err(e) = self.send_initial_state(conn.as_ref(), room).await {
            tracing::warn!(%room_id, %conn_id, error = %e, "failed to send initial state");
            guard.release().await;
            return Err(e);
        }
        let state = state.transition(SessionState::Active)?;
        tracing::info!(%room_id, %conn_id, %state, "player connected");

        // --- Step 3: Move loop ---
        let shutdown = wait_for_shutdown(self.shutdown.subscribe());
        tokio::pin!(shutdown);

        loop {
            let data = tokio::select! {
                received = conn.recv() => match received {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%room_id, %conn_id, "connection closed by peer");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%room_id, %conn_id, error = %e, "recv error");
                        break;
                    }
                },
                () = &mut shutdown => {
                    tracing::info!(%room_id, %conn_id, "server shutting down, ending session");
                    break;
                }
            };

            let frame: ClientFrame = match self.codec.decode(&data) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!(%room_id, %conn_id, error = %e, "malformed frame");
                    continue;
                }
            };

            if !frame.is_move() {
                tracing::debug!(%room_id, %conn_id, action = %frame.action, "ignoring frame");
                continue;
            }
            self.play(&room_id, conn_id, &frame).await;
        }

        // --- Step 4: Cleanup ---
        let state = state.transition(SessionState::Closed)?;
        guard.release().await;
        tracing::info!(%room_id, %conn_id, %state, "player disconnected");
        Ok(())
    }

    /// Validates, applies and persists one move, then returns the room as
    /// re-read from the store.
    ///
    /// Checks run in this order: game over, turn ownership, position
    /// syntax, cell availability. Nothing is written unless all pass.
    ///
    /// # Errors
    /// Any [`MoveError`]; the stored room is unchanged.
    pub async fn process_move(
        &self,
        room_id: &RoomId,
        frame: &ClientFrame,
    ) -> Result<Room, MoveError> {
        let mut room = self.rooms.get_room_info(room_id).await?;
        if room.status.is_over() {
            return Err(MoveError::GameOver);
        }
        if frame.player.is_empty() || room.turn != frame.player {
            return Err(MoveError::NotYourTurn);
        }

        let pos = parse_position(&frame.position)?;
        let mark = room.mark_for(&frame.player);
        room.board = apply_move(&room.board, pos, mark)?;

        let result = outcome(&room.board);
        room.status = RoomStatus::from(result);
        room.winner = match result {
            Outcome::Winner(mark) => Some(mark),
            Outcome::Tie | Outcome::Ongoing => None,
        };
        room.turn = next_player(&room.user1, &room.user2, &frame.player).to_string();

        self.rooms.commit_move(&room).await?;
        tracing::debug!(%room_id, player = %frame.player, pos, %mark, status = %room.status, "move applied");

        Ok(self.rooms.get_room_info(room_id).await?)
    }

    /// Runs one move under the room's move lock (when enabled) and sends
    /// the result: `update` to the room, or `error` per the error scope.
    async fn play(&self, room_id: &RoomId, conn_id: ConnectionId, frame: &ClientFrame) {
        let lock = if self.config.serialize_moves {
            self.registry.move_lock(room_id).await
        } else {
            None
        };
        let _turn = match &lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        match self.process_move(room_id, frame).await {
            Ok(room) => {
                if let Some(bytes) = self.encode(room_id, &ServerMessage::Update(room)) {
                    self.registry.broadcast(room_id, &bytes).await;
                }
            }
            Err(e) => {
                tracing::debug!(%room_id, %conn_id, player = %frame.player, error = %e, "move rejected");
                let Some(bytes) = self.encode(room_id, &ServerMessage::error(e.to_string())) else {
                    return;
                };
                match self.config.error_scope {
                    ErrorScope::Room => {
                        self.registry.broadcast(room_id, &bytes).await;
                    }
                    ErrorScope::Sender => {
                        self.registry.send_to(room_id, conn_id, &bytes).await;
                    }
                }
            }
        }
    }

    async fn send_initial_state(&self, conn: &C, room: Room) -> Result<(), TictacError> {
        let bytes = self.codec.encode(&ServerMessage::InitialState(room))?;
        conn.send(&bytes)
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))?;
        Ok(())
    }

    /// Connect-phase checks. On success the connection is registered.
    async fn admit(&self, conn: &Arc<C>) -> Result<(RoomId, Room), TictacError> {
        let room_id = room_id_from_path(conn.path()).ok_or(SessionError::MissingRoomId)?;
        let room = match self.rooms.get_room_info(&room_id).await {
            Ok(room) => room,
            Err(RoomError::NotFound(id)) => return Err(SessionError::RoomNotFound(id).into()),
            Err(e) => return Err(e.into()),
        };
        if room.status != RoomStatus::Started {
            return Err(SessionError::RoomNotStarted(room_id).into());
        }
        self.registry
            .try_register(&room_id, Arc::clone(conn))
            .await?;
        Ok((room_id, room))
    }

    /// Tells a refused client why, then closes the connection.
    async fn reject(&self, conn: &C, err: &TictacError) {
        if let Ok(bytes) = self.codec.encode(&ServerMessage::error(err.to_string())) {
            if let Err(e) = conn.send(&bytes).await {
                tracing::debug!(conn_id = %conn.id(), error = %e, "failed to send rejection");
            }
        }
        if let Err(e) = conn.close().await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "failed to close rejected connection");
        }
    }

    fn encode(&self, room_id: &RoomId, msg: &ServerMessage) -> Option<Vec<u8>> {
        match self.codec.encode(msg) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::error!(%room_id, error = %e, "failed to encode server message");
                None
            }
        }
    }
}

/// Extracts the room id from `/ws/{room_id}`. A trailing slash is
/// tolerated; anything else (missing id, nested segments) is `None`.
pub fn room_id_from_path(path: &str) -> Option<RoomId> {
    let id = path.strip_prefix(WS_PATH_PREFIX)?.trim_end_matches('/');
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(RoomId::from(id))
}

/// Resolves once the shutdown flag is raised (or its sender is gone).
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
