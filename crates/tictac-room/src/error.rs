//! Error types for the room layer.

use tictac_protocol::RoomId;
use tictac_store::StoreError;

/// Errors that can occur during room operations.
///
/// The `Display` text of the player-facing variants is what HTTP clients
/// see in `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room is stored under this id.
    #[error("room not found")]
    NotFound(RoomId),

    /// Both player slots are taken.
    #[error("room is full")]
    RoomFull,

    /// The joining player picked the creator's nickname.
    #[error("nickname already in use")]
    NicknameConflict,

    /// A nickname was empty.
    #[error("nickname must not be empty")]
    InvalidNickname,

    /// The game cannot start until a second player joins.
    #[error("cannot start game, room is not full")]
    NotFull,

    /// The caller is not the room's admin (or the room is gone).
    #[error("only the admin can do this")]
    NotAdmin,

    /// The leaving player is neither `user1` nor `user2`.
    #[error("user not found in room")]
    UserNotInRoom,

    /// The backing store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => Self::NotFound(RoomId::from(key)),
            other => Self::Store(other),
        }
    }
}

impl RoomError {
    /// Returns `true` if the failure came from the store rather than from
    /// the request itself.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
