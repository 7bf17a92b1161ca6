//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The session loop never touches `serde_json` directly: it asks its
//! [`Codec`] to turn a [`ServerMessage`](crate::ServerMessage) into bytes
//! and bytes into a [`ClientFrame`](crate::ClientFrame). Swapping the
//! format means swapping the codec, nothing else.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`). Browser clients speak
/// JSON text frames, so this is the codec the server runs with.
///
/// ## Example
///
/// ```rust
/// use tictac_protocol::{ClientFrame, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame: ClientFrame = codec
///     .decode(br#"{"action":"make_move","player":"alice","position":"4"}"#)
///     .unwrap();
/// assert!(frame.is_move());
/// assert_eq!(frame.position, "4");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
