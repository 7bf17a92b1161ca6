//! The room service: every room mutation outside of a single move.

use rand::Rng;
use tictac_protocol::{Room, RoomId, RoomStatus};
use tictac_store::{RoomStore, room_from_fields, room_to_fields};

use crate::RoomError;

/// Namespace prefix of every generated room id.
pub const ROOM_ID_PREFIX: &str = "room-";

/// What a successful [`RoomService::leave_room`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The creator left, so the whole room was deleted.
    RoomDeleted,
    /// The second player left and the slot is open again.
    SlotCleared,
}

/// Room lifecycle operations over a [`RoomStore`].
///
/// Updates read the room and then write only the fields they change, with
/// no lock across the two steps. A delete landing in between leaves a
/// fragment hash without `admin`, which every later read treats as
/// [`RoomError::NotFound`].
///
/// ## Lifecycle
///
/// ```text
/// create_room ──→ [waiting] ──join_room──→ [waiting, 2 players]
///                                              │
///                                          start_game
///                                              ▼
///              commit_move ←── live play ── [started]
///                   │
///                   ▼
///      [ongoing] → [finished | tie]
///
/// delete_room / leave_room(user1) ──→ gone
/// ```
pub struct RoomService<S> {
    store: S,
}

impl<S: RoomStore> RoomService<S> {
    /// Creates a service over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a room owned by `admin` and returns its initial record.
    ///
    /// The admin is `user1` and moves first.
    ///
    /// # Errors
    /// - [`RoomError::InvalidNickname`] if `admin` is empty
    /// - [`RoomError::Store`] if the store is unreachable
    pub async fn create_room(&self, admin: &str) -> Result<Room, RoomError> {
        if admin.is_empty() {
            return Err(RoomError::InvalidNickname);
        }
        let room = Room::new(generate_room_id(), admin);
        self.store
            .hash_set(room.id.as_str(), room_to_fields(&room))
            .await?;
        tracing::info!(room_id = %room.id, admin, "room created");
        Ok(room)
    }

    /// Puts `user` into the second slot.
    ///
    /// A room that was `started` (possible after the admin removed the
    /// previous opponent) goes back to `waiting` and must be started
    /// again.
    ///
    /// # Errors
    /// In check order: [`RoomError::InvalidNickname`],
    /// [`RoomError::NotFound`], [`RoomError::RoomFull`],
    /// [`RoomError::NicknameConflict`].
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        user: &str,
    ) -> Result<Room, RoomError> {
        if user.is_empty() {
            return Err(RoomError::InvalidNickname);
        }
        let mut room = self.get_room_info(room_id).await?;
        if room.has_opponent() {
            return Err(RoomError::RoomFull);
        }
        if user == room.user1 {
            return Err(RoomError::NicknameConflict);
        }

        room.user2 = user.to_string();
        let mut fields = vec![("user2".to_string(), room.user2.clone())];
        if room.status == RoomStatus::Started {
            room.status = RoomStatus::Waiting;
            fields.push(("status".to_string(), room.status.to_string()));
        }
        self.store.hash_set(room_id.as_str(), fields).await?;

        tracing::info!(%room_id, user, status = %room.status, "player joined room");
        Ok(room)
    }

    /// Reads the current record of a room.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if absent, [`RoomError::Store`] if the
    /// store fails or the record does not parse.
    pub async fn get_room_info(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        if room_id.is_empty() {
            return Err(RoomError::NotFound(room_id.clone()));
        }
        let fields = self.store.hash_get_all(room_id.as_str()).await?;
        Ok(room_from_fields(room_id, &fields)?)
    }

    /// Checks that `admin` is the admin of an existing room.
    ///
    /// A missing room fails the same way as a wrong admin.
    ///
    /// # Errors
    /// [`RoomError::NotAdmin`] on either failure, [`RoomError::Store`] if
    /// the store is unreachable.
    pub async fn authorize_admin(
        &self,
        room_id: &RoomId,
        admin: &str,
    ) -> Result<Room, RoomError> {
        match self.get_room_info(room_id).await {
            Ok(room) if room.is_admin(admin) => Ok(room),
            Ok(_) | Err(RoomError::NotFound(_)) => {
                tracing::warn!(%room_id, admin, "admin check failed");
                Err(RoomError::NotAdmin)
            }
            Err(e) => Err(e),
        }
    }

    /// Removes the room entirely. The caller checks authorisation first
    /// (see [`authorize_admin`](Self::authorize_admin)).
    pub async fn delete_room(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.store.delete(room_id.as_str()).await?;
        tracing::info!(%room_id, "room deleted");
        Ok(())
    }

    /// Clears the second slot. `status` is left as it is, so a `started`
    /// room stays `started` with one player until someone joins.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room does not exist.
    pub async fn remove_user(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let room = self.get_room_info(room_id).await?;
        self.clear_second_slot(room_id).await?;
        tracing::info!(%room_id, removed = %room.user2, "second player removed");
        Ok(())
    }

    /// Marks the room `started`. Any caller holding the id may start it.
    ///
    /// # Errors
    /// [`RoomError::NotFound`], or [`RoomError::NotFull`] if nobody has
    /// joined.
    pub async fn start_game(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let room = self.get_room_info(room_id).await?;
        if !room.has_opponent() {
            return Err(RoomError::NotFull);
        }
        self.store
            .hash_set(
                room_id.as_str(),
                vec![("status".to_string(), RoomStatus::Started.to_string())],
            )
            .await?;
        tracing::info!(%room_id, "game started");
        Ok(())
    }

    /// `user` leaves the room. The creator leaving deletes the room; the
    /// second player leaving frees the slot.
    ///
    /// # Errors
    /// [`RoomError::NotFound`], or [`RoomError::UserNotInRoom`] if `user`
    /// is neither player.
    pub async fn leave_room(
        &self,
        room_id: &RoomId,
        user: &str,
    ) -> Result<LeaveOutcome, RoomError> {
        let room = self.get_room_info(room_id).await?;
        if !user.is_empty() && user == room.user1 {
            self.delete_room(room_id).await?;
            Ok(LeaveOutcome::RoomDeleted)
        } else if !user.is_empty() && user == room.user2 {
            self.clear_second_slot(room_id).await?;
            tracing::info!(%room_id, user, "second player left");
            Ok(LeaveOutcome::SlotCleared)
        } else {
            Err(RoomError::UserNotInRoom)
        }
    }

    /// Persists the result of one accepted move as a single write of
    /// `board`, `turn`, `status` and `winner`.
    pub async fn commit_move(&self, room: &Room) -> Result<(), RoomError> {
        let fields = vec![
            ("board".to_string(), room.board.to_string()),
            ("turn".to_string(), room.turn.clone()),
            ("status".to_string(), room.status.to_string()),
            (
                "winner".to_string(),
                room.winner.map(|m| m.to_string()).unwrap_or_default(),
            ),
        ];
        self.store.hash_set(room.id.as_str(), fields).await?;
        Ok(())
    }

    async fn clear_second_slot(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.store
            .hash_set(room_id.as_str(), vec![("user2".to_string(), String::new())])
            .await?;
        Ok(())
    }
}

/// Generates a fresh room id: the `room-` prefix followed by 32 lowercase
/// hex characters (128 random bits).
pub fn generate_room_id() -> RoomId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    RoomId::from(format!("{ROOM_ID_PREFIX}{hex}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_room_id_format() {
        let id = generate_room_id();
        let hex = id.as_str().strip_prefix(ROOM_ID_PREFIX).expect("prefixed");
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_room_id_is_unique() {
        assert_ne!(generate_room_id(), generate_room_id());
    }
}
