//! Move legality and end-of-game detection.

use crate::{BOARD_CELLS, Board, EngineError, Mark};

/// The eight winning lines, checked in this order: rows, columns,
/// then the two diagonals.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Where a board stands after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A line of three identical marks exists.
    Winner(Mark),
    /// No empty cells and no winner.
    Tie,
    /// Play continues.
    Ongoing,
}

/// Parses a client-supplied position. Clients send the index as a string
/// (`"0"` to `"8"`). Surrounding whitespace is not accepted.
///
/// # Errors
/// [`EngineError::InvalidPosition`] if the text is not an integer in range.
pub fn parse_position(raw: &str) -> Result<usize, EngineError> {
    match raw.parse::<i64>() {
        Ok(pos) if (0..BOARD_CELLS as i64).contains(&pos) => Ok(pos as usize),
        _ => Err(EngineError::InvalidPosition(raw.to_string())),
    }
}

/// Places `mark` at `pos` and returns the resulting board.
///
/// The input board is never modified; a rejected move leaves the caller's
/// board exactly as it was.
///
/// # Errors
/// - [`EngineError::InvalidPosition`] if `pos` is not in `0..=8`
/// - [`EngineError::CellOccupied`] if the cell already holds a mark
pub fn apply_move(
    board: &Board,
    pos: usize,
    mark: Mark,
) -> Result<Board, EngineError> {
    if pos >= BOARD_CELLS {
        return Err(EngineError::InvalidPosition(pos.to_string()));
    }
    if !board.is_empty_at(pos) {
        return Err(EngineError::CellOccupied(pos));
    }
    Ok(board.with(pos, mark))
}

/// Returns the mark of the first complete line in [`WIN_LINES`] order.
pub fn check_winner(board: &Board) -> Option<Mark> {
    WIN_LINES.iter().find_map(|&[a, b, c]| {
        let mark = board.get(a)?;
        (board.get(b) == Some(mark) && board.get(c) == Some(mark))
            .then_some(mark)
    })
}

/// Returns `true` when no empty cell remains.
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(Option::is_some)
}

/// Win first, then tie, otherwise ongoing.
pub fn outcome(board: &Board) -> Outcome {
    match check_winner(board) {
        Some(mark) => Outcome::Winner(mark),
        None if is_full(board) => Outcome::Tie,
        None => Outcome::Ongoing,
    }
}

/// Alternates the turn: `user1` hands over to `user2`, anyone else hands
/// back to `user1`.
pub fn next_player<'a>(
    user1: &'a str,
    user2: &'a str,
    current: &str,
) -> &'a str {
    if current == user1 { user2 } else { user1 }
}
