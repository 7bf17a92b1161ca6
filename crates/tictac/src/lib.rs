//! # tictac
//!
//! Two-player tic-tac-toe room server.
//!
//! Rooms are created, joined, started, and torn down through a small HTTP
//! API ([`http::router`]). Once a room is `started`, both players open a
//! WebSocket at `/ws/{room_id}` and play live: every accepted move is
//! validated against the stored room, persisted, and broadcast to both
//! connections as a full room snapshot.
//!
//! All room state lives in a [`RoomStore`](tictac_store::RoomStore):
//! either the in-process [`MemoryStore`](tictac_store::MemoryStore) or
//! Redis (`tictac-store` feature `redis`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tictac::prelude::*;
//!
//! # async fn run() -> Result<(), TictacError> {
//! let server = TictacServerBuilder::new()
//!     .http_bind("0.0.0.0:8080")
//!     .ws_bind("0.0.0.0:8081")
//!     .build(MemoryStore::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
pub mod http;
mod server;

pub use error::{MoveError, TictacError};
pub use handler::{SessionCoordinator, WS_PATH_PREFIX, room_id_from_path};
pub use server::{ServerConfig, ShutdownHandle, TictacServer, TictacServerBuilder};

/// Everything needed to run a server or drive a room from code.
pub mod prelude {
    pub use crate::http::{ApiError, router};
    pub use crate::{
        MoveError, ServerConfig, SessionCoordinator, ShutdownHandle, TictacError,
        TictacServer, TictacServerBuilder,
    };
    pub use tictac_engine::{Board, Mark, Outcome};
    pub use tictac_protocol::{
        ClientFrame, Codec, JsonCodec, Room, RoomId, RoomStatus, ServerMessage,
    };
    pub use tictac_room::{LeaveOutcome, RoomError, RoomService};
    pub use tictac_session::{ErrorScope, SessionConfig};
    pub use tictac_store::{MemoryStore, RoomStore, StoreError};
}
