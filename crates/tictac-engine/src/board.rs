//! The board: nine cells, each empty or holding a player's mark.
//!
//! Cells are indexed row-major:
//!
//! ```text
//!  0 | 1 | 2
//! ---+---+---
//!  3 | 4 | 5
//! ---+---+---
//!  6 | 7 | 8
//! ```
//!
//! On the wire and in the room store a board is a 9-character string:
//! `' '` for an empty cell, `'X'` or `'O'` otherwise. `"X   O    "` is a
//! board with X in the top-left corner and O in the centre.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

const EMPTY_CHAR: char = ' ';

// ---------------------------------------------------------------------------
// Mark
// ---------------------------------------------------------------------------

/// A player's symbol. The room's first player plays `X`, the second `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Returns the single character used in the board encoding.
    pub fn as_char(self) -> char {
        match self {
            Self::X => 'X',
            Self::O => 'O',
        }
    }

    /// Parses a board character. `None` for anything but `X` / `O`.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Self::X),
            'O' => Some(Self::O),
            _ => None,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A 3x3 board. `Copy` because it is nine bytes: moves return a new board
/// instead of mutating a shared one.
///
/// Serialized through its string form, so the JSON snapshot and the store
/// field share one encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Board([Option<Mark>; BOARD_CELLS]);

impl Board {
    /// An empty board.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a board from explicit cells.
    pub fn from_cells(cells: [Option<Mark>; BOARD_CELLS]) -> Self {
        Self(cells)
    }

    /// Returns the mark at `pos`, or `None` if the cell is empty or
    /// `pos` is off the board.
    pub fn get(&self, pos: usize) -> Option<Mark> {
        self.0.get(pos).copied().flatten()
    }

    /// Returns `true` if `pos` is on the board and empty.
    pub fn is_empty_at(&self, pos: usize) -> bool {
        pos < BOARD_CELLS && self.0[pos].is_none()
    }

    /// All nine cells in index order.
    pub fn cells(&self) -> &[Option<Mark>; BOARD_CELLS] {
        &self.0
    }

    pub(crate) fn with(mut self, pos: usize, mark: Mark) -> Self {
        self.0[pos] = Some(mark);
        self
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.0 {
            let c = cell.map_or(EMPTY_CHAR, Mark::as_char);
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// The board string was not nine cells of `' '`, `'X'` or `'O'`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed board {0:?}")]
pub struct ParseBoardError(pub String);

impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [None; BOARD_CELLS];
        let mut count = 0;
        for (i, c) in s.chars().enumerate() {
            if i >= BOARD_CELLS {
                return Err(ParseBoardError(s.to_string()));
            }
            cells[i] = match c {
                EMPTY_CHAR => None,
                other => Some(
                    Mark::from_char(other)
                        .ok_or_else(|| ParseBoardError(s.to_string()))?,
                ),
            };
            count += 1;
        }
        if count != BOARD_CELLS {
            return Err(ParseBoardError(s.to_string()));
        }
        Ok(Self(cells))
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_string()
    }
}

impl TryFrom<String> for Board {
    type Error = ParseBoardError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_renders_as_nine_spaces() {
        assert_eq!(Board::empty().to_string(), "         ");
    }

    #[test]
    fn test_parse_board_with_marks() {
        let board: Board = "X   O   X".parse().unwrap();
        assert_eq!(board.get(0), Some(Mark::X));
        assert_eq!(board.get(4), Some(Mark::O));
        assert_eq!(board.get(8), Some(Mark::X));
        assert_eq!(board.get(1), None);
        assert_eq!(board.to_string(), "X   O   X");
    }

    #[test]
    fn test_parse_board_rejects_wrong_length() {
        assert!("XO".parse::<Board>().is_err());
        assert!("          ".parse::<Board>().is_err());
    }

    #[test]
    fn test_parse_board_rejects_unknown_symbol() {
        let err = "Z        ".parse::<Board>().unwrap_err();
        assert_eq!(err, ParseBoardError("Z        ".into()));
    }

    #[test]
    fn test_get_off_board_is_none() {
        assert_eq!(Board::empty().get(9), None);
        assert!(!Board::empty().is_empty_at(9));
    }

    #[test]
    fn test_board_serializes_as_string() {
        let board = Board::empty().with(2, Mark::O);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, "\"  O      \"");
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
        assert!(serde_json::from_str::<Board>("\"XX\"").is_err());
    }

    #[test]
    fn test_mark_display() {
        assert_eq!(Mark::X.to_string(), "X");
        assert_eq!(Mark::O.to_string(), "O");
    }
}
