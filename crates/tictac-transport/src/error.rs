//! Error types for the transport layer.

/// Errors raised while listening for, upgrading, or talking to a live
/// connection.
///
/// Every variant is fatal to the one connection (or listener) it names;
/// nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The TCP accept itself failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The peer connected but the WebSocket handshake did not complete.
    #[error("upgrade failed: {0}")]
    UpgradeFailed(String),

    /// The peer connected but did not finish the handshake in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// The connection is already gone (closed locally, by the peer, or
    /// because the other end was dropped).
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame failed for a reason other than a clean close.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
