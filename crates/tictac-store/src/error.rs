//! Error types for the store layer.

/// Errors a [`RoomStore`](crate::RoomStore) can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No hash exists under the key (or it has no fields).
    #[error("room not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached or refused the command.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The hash exists but a field is missing or does not parse.
    #[error("corrupt room record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}
