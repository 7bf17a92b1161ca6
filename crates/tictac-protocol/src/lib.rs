//! Wire protocol for tictac.
//!
//! This crate defines what the server and its clients exchange:
//!
//! - **Room record** ([`Room`], [`RoomId`], [`RoomStatus`]): the
//!   authoritative state of one game, as stored and as sent to clients.
//! - **Messages** ([`ServerMessage`], [`ClientFrame`]): the frames on
//!   the live session channel.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those frames are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientFrame / ServerMessage) → Session
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientFrame, MAKE_MOVE, ParseStatusError, Room, RoomId, RoomStatus,
    ServerMessage,
};
