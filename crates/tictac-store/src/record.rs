//! Mapping between a stored hash and a [`Room`].

use std::str::FromStr;

use tictac_engine::{Board, Mark};
use tictac_protocol::{Room, RoomId, RoomStatus};

use crate::{Fields, StoreError};

/// Every field a room hash carries, in write order.
pub const FIELD_NAMES: [&str; 7] =
    ["admin", "user1", "user2", "status", "board", "turn", "winner"];

/// Flattens a room into hash fields. The id is the key, not a field.
pub fn room_to_fields(room: &Room) -> Vec<(String, String)> {
    let winner = room.winner.map(|m| m.to_string()).unwrap_or_default();
    [
        ("admin", room.admin.clone()),
        ("user1", room.user1.clone()),
        ("user2", room.user2.clone()),
        ("status", room.status.to_string()),
        ("board", room.board.to_string()),
        ("turn", room.turn.clone()),
        ("winner", winner),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Rebuilds a room from the hash stored under `id`.
///
/// `user2` and `winner` may be absent and default to empty.
///
/// A hash without `admin` is not a room. Single-field writes (`HSET`) on a
/// key deleted in the meantime leave such a fragment behind, and it reads
/// as absent rather than as a damaged record.
///
/// # Errors
/// - [`StoreError::NotFound`] if `admin` is missing
/// - [`StoreError::Corrupt`] if another required field is missing or a
///   value does not parse
pub fn room_from_fields(id: &RoomId, fields: &Fields) -> Result<Room, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        key: id.to_string(),
        reason,
    };
    let required = |name: &str| {
        fields
            .get(name)
            .cloned()
            .ok_or_else(|| corrupt(format!("missing field {name}")))
    };

    let Some(admin) = fields.get("admin").cloned() else {
        return Err(StoreError::NotFound(id.to_string()));
    };
    let status = RoomStatus::from_str(&required("status")?)
        .map_err(|e| corrupt(e.to_string()))?;
    let board = Board::from_str(&required("board")?)
        .map_err(|e| corrupt(e.to_string()))?;
    let winner = match fields.get("winner").map(String::as_str) {
        None | Some("") => None,
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next().and_then(Mark::from_char), chars.next()) {
                (Some(mark), None) => Some(mark),
                _ => return Err(corrupt(format!("invalid winner {s:?}"))),
            }
        }
    };

    Ok(Room {
        id: id.clone(),
        admin,
        user1: required("user1")?,
        user2: fields.get("user2").cloned().unwrap_or_default(),
        status,
        board,
        turn: required("turn")?,
        winner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Room {
        let mut room = Room::new(RoomId::from("room-1"), "alice");
        room.user2 = "bob".into();
        room.status = RoomStatus::Finished;
        room.board = "XXXOO    ".parse().unwrap();
        room.turn = "bob".into();
        room.winner = Some(Mark::X);
        room
    }

    #[test]
    fn test_fields_use_string_encodings() {
        let fields: Fields = room_to_fields(&sample()).into_iter().collect();
        assert_eq!(fields.len(), FIELD_NAMES.len());
        assert_eq!(fields["status"], "finished");
        assert_eq!(fields["board"], "XXXOO    ");
        assert_eq!(fields["winner"], "X");
        assert!(!fields.contains_key("roomID"));
    }

    #[test]
    fn test_room_from_fields_restores_record() {
        let room = sample();
        let fields: Fields = room_to_fields(&room).into_iter().collect();
        assert_eq!(room_from_fields(&room.id, &fields).unwrap(), room);
    }

    #[test]
    fn test_room_from_fields_tolerates_missing_optional_fields() {
        let fields: Fields = [
            ("admin", "alice"),
            ("user1", "alice"),
            ("status", "waiting"),
            ("board", "         "),
            ("turn", "alice"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let room = room_from_fields(&RoomId::from("room-2"), &fields).unwrap();
        assert!(room.user2.is_empty());
        assert_eq!(room.winner, None);
    }

    #[test]
    fn test_fragment_without_admin_reads_as_missing() {
        let fields: Fields = [("user2".to_string(), String::new())].into_iter().collect();
        assert_eq!(
            room_from_fields(&RoomId::from("room-3"), &fields),
            Err(StoreError::NotFound("room-3".into()))
        );
    }

    #[test]
    fn test_room_from_fields_rejects_bad_values() {
        let mut fields: Fields = room_to_fields(&sample()).into_iter().collect();
        fields.insert("board".into(), "XX".into());
        assert!(matches!(
            room_from_fields(&RoomId::from("room-1"), &fields),
            Err(StoreError::Corrupt { .. })
        ));

        let mut fields: Fields = room_to_fields(&sample()).into_iter().collect();
        fields.remove("turn");
        assert!(matches!(
            room_from_fields(&RoomId::from("room-1"), &fields),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
