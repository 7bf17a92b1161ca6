//! The room record and the frames of the live session channel.
//!
//! A [`Room`] is serialized in two places with the same field encodings:
//! as the `data` of `initial_state` / `update` frames, and (field by field)
//! as a hash in the room store. The JSON snapshot looks like:
//!
//! ```json
//! {
//!   "roomID": "room-5f0c…",
//!   "admin": "alice", "user1": "alice", "user2": "bob",
//!   "status": "ongoing",
//!   "board": "X        ",
//!   "turn": "bob",
//!   "winner": ""
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tictac_engine::{Board, Mark, Outcome};

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// The unique, immutable identifier of a room. Also the room's store key.
///
/// Serialized as a bare string (`"room-…"`), not as `{"0": "…"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty identifier, which never names a room.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Where a room is in its life.
///
/// ```text
/// waiting ──start──→ started ──first move──→ ongoing ──→ finished | tie
///    ↑                  │
///    └──second player───┘   (a join while started re-opens the room)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Created; waiting for a second player or for the start call.
    Waiting,
    /// Both players present and the game has been started. Live
    /// connections are admitted only in this state.
    Started,
    /// At least one move has been played and nobody has won yet.
    Ongoing,
    /// Someone completed a line.
    Finished,
    /// The board filled up with no winner.
    Tie,
}

impl RoomStatus {
    /// The lower-case name used on the wire and in the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Started => "started",
            Self::Ongoing => "ongoing",
            Self::Finished => "finished",
            Self::Tie => "tie",
        }
    }

    /// Returns `true` once the game has ended (win or tie).
    pub fn is_over(self) -> bool {
        matches!(self, Self::Finished | Self::Tie)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status string was not one of the known names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown room status {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for RoomStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "started" => Ok(Self::Started),
            "ongoing" => Ok(Self::Ongoing),
            "finished" => Ok(Self::Finished),
            "tie" => Ok(Self::Tie),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl From<Outcome> for RoomStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Winner(_) => Self::Finished,
            Outcome::Tie => Self::Tie,
            Outcome::Ongoing => Self::Ongoing,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One game session's authoritative state.
///
/// `user1` is always the admin at creation. `user2` is empty until a
/// second player joins. `turn` names the player to move and `winner`
/// holds the winning mark once the game is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "roomID")]
    pub id: RoomId,
    pub admin: String,
    pub user1: String,
    pub user2: String,
    pub status: RoomStatus,
    pub board: Board,
    pub turn: String,
    #[serde(with = "winner_field")]
    pub winner: Option<Mark>,
}

impl Room {
    /// A freshly created room: `admin` is `user1` and moves first.
    pub fn new(id: RoomId, admin: &str) -> Self {
        Self {
            id,
            admin: admin.to_string(),
            user1: admin.to_string(),
            user2: String::new(),
            status: RoomStatus::Waiting,
            board: Board::empty(),
            turn: admin.to_string(),
            winner: None,
        }
    }

    /// Returns `true` once a second player has joined.
    pub fn has_opponent(&self) -> bool {
        !self.user2.is_empty()
    }

    /// Returns `true` if `who` created the room.
    pub fn is_admin(&self, who: &str) -> bool {
        !who.is_empty() && self.admin == who
    }

    /// The mark `player` plays with: `O` for the second player, `X` for
    /// everyone else.
    pub fn mark_for(&self, player: &str) -> Mark {
        if self.has_opponent() && player == self.user2 {
            Mark::O
        } else {
            Mark::X
        }
    }
}

/// `winner` travels as `""`, `"X"` or `"O"`.
mod winner_field {
    use serde::{Deserialize, Deserializer, Serializer};
    use tictac_engine::Mark;

    pub fn serialize<S: Serializer>(
        winner: &Option<Mark>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match winner {
            Some(mark) => serializer.serialize_str(&mark.to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Mark>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(None),
            (Some(c), None) => Mark::from_char(c).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid winner {s:?}"))
            }),
            _ => Err(serde::de::Error::custom(format!("invalid winner {s:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage (server → client)
// ---------------------------------------------------------------------------

/// Frames the server pushes down a live connection.
///
/// Adjacently tagged, so every frame is `{"type": …, "data": …}`:
///
/// ```json
/// {"type": "initial_state", "data": { …room… }}
/// {"type": "update",        "data": { …room… }}
/// {"type": "error",         "data": {"message": "it's not your turn"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full snapshot sent once, right after a connection is admitted.
    InitialState(Room),
    /// Full snapshot after an accepted move.
    Update(Room),
    /// A move was rejected or the connection could not be admitted.
    Error { message: String },
}

impl ServerMessage {
    /// Shorthand for an `error` frame.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientFrame (client → server)
// ---------------------------------------------------------------------------

/// The `action` value of a move request.
pub const MAKE_MOVE: &str = "make_move";

/// A client request: a flat object of string fields.
///
/// Missing fields decode as empty strings, so any JSON object whose values
/// are strings decodes; frames with an `action` other than
/// [`MAKE_MOVE`] are ignored by the session loop. `position` stays a
/// string here and is parsed by the rules engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientFrame {
    pub action: String,
    pub player: String,
    pub position: String,
}

impl ClientFrame {
    /// Builds a `make_move` request.
    pub fn make_move(player: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            action: MAKE_MOVE.to_string(),
            player: player.into(),
            position: position.into(),
        }
    }

    /// Returns `true` if this frame asks for a move.
    pub fn is_move(&self) -> bool {
        self.action == MAKE_MOVE
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The JSON shapes below are what browser clients parse, so each one
    //! is pinned down explicitly.

    use super::*;

    fn room() -> Room {
        Room::new(RoomId::from("room-abc"), "alice")
    }

    // =====================================================================
    // RoomId / RoomStatus
    // =====================================================================

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::from("room-1")).unwrap();
        assert_eq!(json, "\"room-1\"");
        assert_eq!(RoomId::from("room-1").to_string(), "room-1");
    }

    #[test]
    fn test_room_status_names_round_trip_through_from_str() {
        for status in [
            RoomStatus::Waiting,
            RoomStatus::Started,
            RoomStatus::Ongoing,
            RoomStatus::Finished,
            RoomStatus::Tie,
        ] {
            assert_eq!(status.as_str().parse::<RoomStatus>(), Ok(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("playing".parse::<RoomStatus>().is_err());
    }

    #[test]
    fn test_room_status_from_outcome() {
        assert_eq!(
            RoomStatus::from(Outcome::Winner(Mark::O)),
            RoomStatus::Finished
        );
        assert_eq!(RoomStatus::from(Outcome::Tie), RoomStatus::Tie);
        assert_eq!(RoomStatus::from(Outcome::Ongoing), RoomStatus::Ongoing);
        assert!(RoomStatus::Tie.is_over());
        assert!(!RoomStatus::Started.is_over());
    }

    // =====================================================================
    // Room
    // =====================================================================

    #[test]
    fn test_new_room_defaults() {
        let room = room();
        assert_eq!(room.user1, "alice");
        assert_eq!(room.admin, "alice");
        assert_eq!(room.turn, "alice");
        assert!(room.user2.is_empty());
        assert!(!room.has_opponent());
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.board, Board::empty());
        assert_eq!(room.winner, None);
    }

    #[test]
    fn test_room_json_format() {
        let mut room = room();
        room.user2 = "bob".into();
        room.winner = Some(Mark::X);
        let json = serde_json::to_value(&room).unwrap();

        assert_eq!(json["roomID"], "room-abc");
        assert_eq!(json["user2"], "bob");
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["board"], "         ");
        assert_eq!(json["winner"], "X");

        let back: Room = serde_json::from_value(json).unwrap();
        assert_eq!(back, room);
    }

    #[test]
    fn test_room_winner_empty_string_when_none() {
        let json = serde_json::to_value(room()).unwrap();
        assert_eq!(json["winner"], "");
    }

    #[test]
    fn test_mark_for_players() {
        let mut room = room();
        // Before anyone joins, even an empty name is not O.
        assert_eq!(room.mark_for(""), Mark::X);
        room.user2 = "bob".into();
        assert_eq!(room.mark_for("alice"), Mark::X);
        assert_eq!(room.mark_for("bob"), Mark::O);
    }

    #[test]
    fn test_is_admin() {
        let room = room();
        assert!(room.is_admin("alice"));
        assert!(!room.is_admin("bob"));
        assert!(!room.is_admin(""));
    }

    // =====================================================================
    // ServerMessage / ClientFrame
    // =====================================================================

    #[test]
    fn test_server_message_initial_state_json_format() {
        let json = serde_json::to_value(ServerMessage::InitialState(room())).unwrap();
        assert_eq!(json["type"], "initial_state");
        assert_eq!(json["data"]["roomID"], "room-abc");
    }

    #[test]
    fn test_server_message_error_json_format() {
        let json = serde_json::to_value(ServerMessage::error("nope")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["data"]["message"], "nope");
    }

    #[test]
    fn test_client_frame_decodes_make_move() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"action":"make_move","player":"bob","position":"8"}"#,
        )
        .unwrap();
        assert_eq!(frame, ClientFrame::make_move("bob", "8"));
        assert!(frame.is_move());
    }

    #[test]
    fn test_client_frame_missing_fields_default_to_empty() {
        let frame: ClientFrame = serde_json::from_str(r#"{"action":"chat"}"#).unwrap();
        assert!(!frame.is_move());
        assert!(frame.player.is_empty());
    }

    #[test]
    fn test_client_frame_rejects_numeric_position() {
        let result: Result<ClientFrame, _> = serde_json::from_str(
            r#"{"action":"make_move","player":"bob","position":8}"#,
        );
        assert!(result.is_err(), "positions travel as strings");
    }
}
