//! Room lifecycle operations for tictac.
//!
//! [`RoomService`] is the single entry point for everything that changes
//! a room outside of live play: creating it, pairing a second player,
//! starting, leaving, and the admin-only delete / remove-user actions.
//! Live play writes its result back through
//! [`RoomService::commit_move`].
//!
//! All state lives in a [`RoomStore`](tictac_store::RoomStore); the
//! service keeps nothing in memory, so any number of request handlers and
//! session tasks can share one instance behind an `Arc`.

mod error;
mod service;

pub use error::RoomError;
pub use service::{LeaveOutcome, ROOM_ID_PREFIX, RoomService, generate_room_id};
