//! Unified error types for the tictac server.

use tictac_engine::EngineError;
use tictac_protocol::ProtocolError;
use tictac_room::RoomError;
use tictac_session::SessionError;
use tictac_store::StoreError;
use tictac_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TictacError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A live connection was refused or misused its lifecycle.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The room store failed outside of a room operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Binding or serving the HTTP listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a `make_move` was rejected.
///
/// The `Display` text is exactly what the `error` frame carries, and the
/// session stays open after any of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// `player` is not the one whose turn it is.
    #[error("it's not your turn")]
    NotYourTurn,

    /// The room is already `finished` or `tie`.
    #[error("game is over")]
    GameOver,

    /// The position did not parse or the cell is taken.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Reading or writing the room failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let tictac_err: TictacError = err.into();
        assert!(matches!(tictac_err, TictacError::Transport(_)));
        assert!(tictac_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let source = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let tictac_err: TictacError = ProtocolError::Decode(source).into();
        assert!(matches!(tictac_err, TictacError::Protocol(_)));
        assert!(tictac_err.to_string().starts_with("decode failed"));
    }

    #[test]
    fn test_from_session_error() {
        let tictac_err: TictacError = SessionError::MissingRoomId.into();
        assert!(matches!(tictac_err, TictacError::Session(_)));
        assert_eq!(tictac_err.to_string(), "room_id is required");
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(tictac_protocol::RoomId::from("room-1"));
        let tictac_err: TictacError = err.into();
        assert!(matches!(tictac_err, TictacError::Room(_)));
    }

    #[test]
    fn test_move_error_messages() {
        assert_eq!(MoveError::NotYourTurn.to_string(), "it's not your turn");
        assert_eq!(MoveError::GameOver.to_string(), "game is over");
        assert_eq!(
            MoveError::from(EngineError::CellOccupied(0)).to_string(),
            "position already occupied"
        );
        assert_eq!(
            MoveError::from(EngineError::InvalidPosition("9".into())).to_string(),
            "invalid position"
        );
        assert_eq!(
            MoveError::from(RoomError::NotFound("room-1".into())).to_string(),
            "room not found"
        );
    }
}
