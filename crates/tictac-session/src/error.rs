//! Error types for the session layer.

use tictac_protocol::RoomId;

/// Reasons a live connection is refused before it becomes active.
///
/// All of them are terminal for the connection attempt. The `Display`
/// text is sent to the client in an `error` frame before the connection
/// is closed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The upgrade path did not name a room.
    #[error("room_id is required")]
    MissingRoomId,

    /// No room exists under the requested id.
    #[error("Room not found")]
    RoomNotFound(RoomId),

    /// The room exists but its status is not `started`.
    #[error("Room is not started")]
    RoomNotStarted(RoomId),

    /// Two connections are already registered for the room.
    #[error("Room is full")]
    RoomFull(RoomId),

    /// The lifecycle was asked to take a step it does not allow.
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: crate::SessionState,
        to: crate::SessionState,
    },
}
