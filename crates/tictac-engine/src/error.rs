//! Error types for the rules engine.

/// Reasons a move can be rejected by the rules.
///
/// The `Display` text is sent to clients verbatim inside an `error`
/// message, so it is kept short and player-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The position is not an integer in `0..=8`.
    #[error("invalid position")]
    InvalidPosition(String),

    /// The target cell already holds a mark.
    #[error("position already occupied")]
    CellOccupied(usize),
}
