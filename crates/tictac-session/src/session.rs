//! Per-connection session types: configuration and the lifecycle state
//! machine a connection walks through.

use std::fmt;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Who hears about a rejected move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorScope {
    /// Every connection in the room gets the `error` frame.
    #[default]
    Room,
    /// Only the connection that sent the move gets it.
    Sender,
}

/// Configuration for the live session loop.
///
/// Defaults: errors go to the whole room, and moves in one room are
/// serialised.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where `error` frames for rejected moves are sent.
    pub error_scope: ErrorScope,

    /// Hold the room's move lock around read-validate-apply-persist-
    /// broadcast. With this off, two moves racing in the same room are
    /// last-write-wins on the board.
    pub serialize_moves: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_scope: ErrorScope::Room,
            serialize_moves: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle of one live connection.
///
/// ```text
/// Connecting ──admit──→ Registered ──initial_state──→ Active
///     │                     │                           │
///     └─────────────────────┴───────────────────────────┴──→ Closed
/// ```
///
/// - **Connecting**: upgraded, room id and room status being checked.
/// - **Registered**: admitted into the registry, snapshot not yet sent.
/// - **Active**: snapshot delivered; the move loop is running.
/// - **Closed**: terminal. Reached from any state on rejection, read or
///   write failure, peer disconnect, or shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    Registered,
    Active,
    Closed,
}

impl SessionState {
    /// The next state on the happy path, `None` once closed.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Connecting => Some(Self::Registered),
            Self::Registered => Some(Self::Active),
            Self::Active => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns `true` if moving to `target` is allowed. Any live state may
    /// close; otherwise states advance one step at a time.
    pub fn can_transition_to(self, target: Self) -> bool {
        match target {
            Self::Closed => self != Self::Closed,
            _ => self.next() == Some(target),
        }
    }

    /// Moves to `target`, or reports the illegal step.
    pub fn transition(self, target: Self) -> Result<Self, SessionError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(SessionError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Registered => write!(f, "Registered"),
            Self::Active => write!(f, "Active"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
