//! Game rules for the 3x3 board.
//!
//! Everything in this crate is a pure function over values: a [`Board`]
//! goes in, a new [`Board`] (or an answer about it) comes out. Nothing is
//! shared and nothing is locked, so any number of session tasks can call
//! into it at once.
//!
//! ```text
//! parse_position("4") → apply_move(board, 4, Mark::X) → outcome(board')
//! ```

mod board;
mod error;
mod rules;

pub use board::{BOARD_CELLS, Board, Mark, ParseBoardError};
pub use error::EngineError;
pub use rules::{
    Outcome, WIN_LINES, apply_move, check_winner, is_full, next_player,
    outcome, parse_position,
};
