//! Live session plumbing for tictac.
//!
//! This crate tracks who is connected to which room right now:
//!
//! 1. **Registry** ([`ConnectionRegistry`]): up to two live connections
//!    per room, with admission control, broadcast, unicast and a per-room
//!    move lock
//! 2. **Session state** ([`SessionState`]): the lifecycle of a single
//!    connection from upgrade to close
//! 3. **Configuration** ([`SessionConfig`], [`ErrorScope`]): how the
//!    session loop reports rejected moves and whether it serialises them
//!
//! # How it fits in the stack
//!
//! ```text
//! Session coordinator (above)  ← drives one loop per connection
//!     ↕
//! Session layer (this crate)   ← who is connected where
//!     ↕
//! Transport layer (below)      ← Connection trait, bytes in and out
//! ```

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::{ConnectionRegistry, ROOM_CAPACITY};
pub use session::{ErrorScope, SessionConfig, SessionState};
