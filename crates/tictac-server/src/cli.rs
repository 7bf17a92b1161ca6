//! Command-line interface for the tictac server.

use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use tictac::ServerConfig;
use tictac_session::{ErrorScope, SessionConfig};

/// Two-player tic-tac-toe room server
#[derive(Parser, Debug)]
#[command(name = "tictac-server")]
#[command(about = "HTTP room API and live WebSocket play for tic-tac-toe", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Address of the HTTP room API
    #[arg(long, env = "HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub http_addr: String,

    /// Address of the WebSocket listener
    #[arg(long, env = "WS_ADDR", default_value = "127.0.0.1:8081")]
    pub ws_addr: String,

    /// Redis URL for room storage. Rooms are kept in memory when unset.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Seconds a new peer gets to complete the WebSocket upgrade
    #[arg(long, env = "HANDSHAKE_TIMEOUT_SECS", default_value_t = 10)]
    pub handshake_timeout_secs: u64,

    /// Seconds live sessions get to finish on shutdown
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    /// Who receives the error frame for a rejected move
    #[arg(long, env = "ERROR_SCOPE", value_enum, default_value_t = ErrorScopeArg::Room)]
    pub error_scope: ErrorScopeArg,

    /// Apply moves in a room one at a time
    #[arg(long, env = "SERIALIZE_MOVES", default_value_t = true, action = ArgAction::Set)]
    pub serialize_moves: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "LOG_FILTER", default_value = "info")]
    pub log_filter: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScopeArg {
    /// Both players see every rejection
    Room,
    /// Only the player who sent the move
    Sender,
}

impl From<ErrorScopeArg> for ErrorScope {
    fn from(arg: ErrorScopeArg) -> Self {
        match arg {
            ErrorScopeArg::Room => Self::Room,
            ErrorScopeArg::Sender => Self::Sender,
        }
    }
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr.clone(),
            ws_addr: self.ws_addr.clone(),
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            error_scope: self.error_scope.into(),
            serialize_moves: self.serialize_moves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tictac-server"]).unwrap();
        let server = cli.server_config();
        assert_eq!(server.shutdown_grace, Duration::from_secs(5));
        assert_eq!(server.handshake_timeout, Duration::from_secs(10));
        let session = cli.session_config();
        assert_eq!(session.error_scope, ErrorScope::Room);
        assert!(session.serialize_moves);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "tictac-server",
            "--http-addr",
            "0.0.0.0:9000",
            "--error-scope",
            "sender",
            "--serialize-moves",
            "false",
            "--redis-url",
            "redis://localhost:6379",
        ])
        .unwrap();
        assert_eq!(cli.server_config().http_addr, "0.0.0.0:9000");
        assert_eq!(cli.session_config().error_scope, ErrorScope::Sender);
        assert!(!cli.session_config().serialize_moves);
        assert_eq!(cli.redis_url.as_deref(), Some("redis://localhost:6379"));
    }
}
