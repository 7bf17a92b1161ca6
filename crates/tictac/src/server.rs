//! `TictacServer` builder and server loop.
//!
//! This is the entry point for running a tictac server. It ties together
//! all the layers: the HTTP room API on one listener, and the live
//! session channel (transport → protocol → session → room) on another.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tictac_protocol::JsonCodec;
use tictac_room::RoomService;
use tictac_session::SessionConfig;
use tictac_store::RoomStore;
use tictac_transport::{PendingConnection, Transport, WebSocketConnection, WebSocketTransport};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::TictacError;
use crate::handler::SessionCoordinator;

type Coordinator<S> = SessionCoordinator<S, WebSocketConnection, JsonCodec>;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Listener addresses and shutdown timing.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address of the HTTP room API.
    pub http_addr: String,
    /// Address of the WebSocket listener (`/ws/{room_id}`).
    pub ws_addr: String,
    /// How long a new peer gets to complete the WebSocket upgrade.
    pub handshake_timeout: Duration,
    /// How long session tasks get to finish after shutdown starts.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8080".to_string(),
            ws_addr: "127.0.0.1:8081".to_string(),
            handshake_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a tictac server.
///
/// # Example
///
/// ```rust,no_run
/// use tictac::prelude::*;
///
/// # async fn run() -> Result<(), TictacError> {
/// let server = TictacServerBuilder::new()
///     .http_bind("0.0.0.0:8080")
///     .ws_bind("0.0.0.0:8081")
///     .build(MemoryStore::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TictacServerBuilder {
    config: ServerConfig,
    session_config: SessionConfig,
}

impl TictacServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the HTTP room API address.
    pub fn http_bind(mut self, addr: &str) -> Self {
        self.config.http_addr = addr.to_string();
        self
    }

    /// Sets the WebSocket listener address.
    pub fn ws_bind(mut self, addr: &str) -> Self {
        self.config.ws_addr = addr.to_string();
        self
    }

    /// Sets how long a peer may take to upgrade to WebSocket.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Sets the shutdown grace period.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    /// Replaces the whole server configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds both listeners over `store`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<S: RoomStore>(self, store: S) -> Result<TictacServer<S>, TictacError> {
        let http = TcpListener::bind(&self.config.http_addr).await?;
        let transport = WebSocketTransport::bind(&self.config.ws_addr).await?;
        tracing::info!(addr = %self.config.http_addr, "HTTP room API listening");

        let rooms = Arc::new(RoomService::new(store));
        let coordinator = Arc::new(SessionCoordinator::new(
            Arc::clone(&rooms),
            JsonCodec,
            self.session_config,
        ));
        let (shutdown, _) = watch::channel(false);

        Ok(TictacServer {
            http,
            transport,
            rooms,
            coordinator,
            shutdown: ShutdownHandle(Arc::new(shutdown)),
            handshake_timeout: self.config.handshake_timeout,
            grace: self.config.shutdown_grace,
        })
    }
}

impl Default for TictacServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ShutdownHandle
// ---------------------------------------------------------------------------

/// Triggers a graceful shutdown of a running [`TictacServer`] from
/// anywhere. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    /// Asks the server to stop. Calling it more than once is harmless.
    pub fn shutdown(&self) {
        self.0.send_replace(true);
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }
}

async fn signalled(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound tictac server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct TictacServer<S: RoomStore> {
    http: TcpListener,
    transport: WebSocketTransport,
    rooms: Arc<RoomService<S>>,
    coordinator: Arc<Coordinator<S>>,
    shutdown: ShutdownHandle,
    handshake_timeout: Duration,
    grace: Duration,
}

impl<S: RoomStore> TictacServer<S> {
    /// Returns the bound `(http, ws)` addresses. Useful when binding to
    /// port 0.
    pub fn local_addrs(&self) -> std::io::Result<(SocketAddr, SocketAddr)> {
        Ok((self.http.local_addr()?, self.transport.local_addr()?))
    }

    /// The room service both listeners share.
    pub fn rooms(&self) -> Arc<RoomService<S>> {
        Arc::clone(&self.rooms)
    }

    /// A handle that stops this server when triggered.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serves until Ctrl-C (or SIGTERM on Unix), then shuts down
    /// gracefully.
    pub async fn run(self) -> Result<(), TictacError> {
        self.run_until(terminate_signal()).await
    }

    /// Serves until `signal` resolves or the [`ShutdownHandle`] fires.
    ///
    /// On shutdown: the HTTP server stops, no further WebSocket
    /// connections are accepted, every session is signalled and its
    /// connection closed, and session tasks get the grace period to
    /// finish before the rest are aborted.
    pub async fn run_until<F>(self, signal: F) -> Result<(), TictacError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            http,
            mut transport,
            rooms,
            coordinator,
            shutdown,
            handshake_timeout,
            grace,
        } = self;

        {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                signal.await;
                shutdown.shutdown();
            });
        }

        let app = crate::http::router(rooms);
        let http_stop = signalled(shutdown.subscribe());
        let http_task = tokio::spawn(async move {
            axum::serve(http, app)
                .with_graceful_shutdown(http_stop)
                .await
        });

        tracing::info!("tictac server running");
        let mut sessions = JoinSet::new();
        let stop = signalled(shutdown.subscribe());
        tokio::pin!(stop);

        loop {
            tokio::select! {
                accepted = transport.accept() => match accepted {
                    Ok(pending) => {
                        let coordinator = Arc::clone(&coordinator);
                        let peer = pending.peer_addr();
                        sessions.spawn(async move {
                            let conn = match pending.establish(handshake_timeout).await {
                                Ok(conn) => conn,
                                Err(e) => {
                                    tracing::debug!(%peer, error = %e, "WebSocket upgrade failed");
                                    return;
                                }
                            };
                            if let Err(e) = coordinator.handle_connection(conn).await {
                                tracing::debug!(error = %e, "session ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = &mut stop => break,
            }

            // Reap finished sessions.
            while let Some(finished) = sessions.try_join_next() {
                if let Err(e) = finished {
                    tracing::error!(error = %e, "session task panicked");
                }
            }
        }

        tracing::info!("shutdown requested, closing sessions");
        // Dropping the listener refuses further peers.
        drop(transport);
        coordinator.shutdown().await;

        let drained = tokio::time::timeout(grace, async {
            while sessions.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(remaining = sessions.len(), "grace period elapsed, aborting sessions");
            sessions.abort_all();
            while sessions.join_next().await.is_some() {}
        }

        match tokio::time::timeout(grace, http_task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task failed"),
            Err(_) => tracing::warn!("HTTP server did not stop within the grace period"),
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn terminate_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
