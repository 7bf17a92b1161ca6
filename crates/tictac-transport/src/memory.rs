//! In-process connection pair.
//!
//! [`MemoryConnection::pair`] returns the server half (a [`Connection`])
//! and the client half (a [`MemoryPeer`]), joined by two unbounded
//! channels. Registry and session tests use it to play both sides of a
//! game without opening sockets.

use tokio::sync::{Mutex, mpsc, watch};

use crate::{Connection, ConnectionId, TransportError};

/// Server-side half of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    path: String,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: watch::Sender<bool>,
}

/// Client-side half of an in-memory connection.
pub struct MemoryPeer {
    to_server: Option<mpsc::UnboundedSender<Vec<u8>>>,
    from_server: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryConnection {
    /// Creates a connected pair. `path` is reported by
    /// [`Connection::path`], as if the peer had requested it.
    pub fn pair(path: impl Into<String>) -> (Self, MemoryPeer) {
        let (to_server, inbound) = mpsc::unbounded_channel();
        let (outbound, from_server) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        let conn = Self {
            id: ConnectionId::next(),
            path: path.into(),
            outbound,
            inbound: Mutex::new(inbound),
            closed,
        };
        let peer = MemoryPeer {
            to_server: Some(to_server),
            from_server,
        };
        (conn, peer)
    }

    /// Returns `true` once [`close`](Connection::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed("closed locally".into()));
        }
        self.outbound
            .send(data.to_vec())
            .map_err(|_| TransportError::ConnectionClosed("peer gone".into()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Ok(None);
        }
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            msg = inbound.recv() => Ok(msg),
            _ = closed.wait_for(|c| *c) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.closed.send_replace(true);
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn path(&self) -> &str {
        &self.path
    }
}

impl MemoryPeer {
    /// Sends a message to the server half.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        let tx = self
            .to_server
            .as_ref()
            .ok_or_else(|| TransportError::ConnectionClosed("disconnected".into()))?;
        tx.send(data.into())
            .map_err(|_| TransportError::ConnectionClosed("server gone".into()))
    }

    /// Waits for the next message from the server. `None` once the server
    /// half is dropped.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.from_server.recv().await
    }

    /// Returns a message if one is already queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.from_server.try_recv().ok()
    }

    /// Hangs up: the server's next `recv` returns `Ok(None)`.
    pub fn disconnect(&mut self) {
        self.to_server = None;
    }

    /// Stops accepting server messages: the server's next `send` fails.
    pub fn refuse_incoming(&mut self) {
        self.from_server.close();
    }
}
