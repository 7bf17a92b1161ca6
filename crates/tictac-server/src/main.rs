//! tictac-server
//!
//! Runs the room API and the live WebSocket listener over Redis, or over
//! an in-memory store when no Redis URL is given.

mod cli;

use clap::Parser;
use cli::Cli;
use tictac::{TictacError, TictacServerBuilder};
use tictac_store::{MemoryStore, RedisStore, RoomStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), TictacError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_filter)),
        )
        .init();

    match cli.redis_url.as_deref() {
        Some(url) => {
            tracing::info!("using Redis room store");
            run(&cli, RedisStore::connect(url).await?).await
        }
        None => {
            tracing::warn!("REDIS_URL not set, rooms are kept in memory");
            run(&cli, MemoryStore::new()).await
        }
    }
}

async fn run<S: RoomStore>(cli: &Cli, store: S) -> Result<(), TictacError> {
    let server = TictacServerBuilder::new()
        .config(cli.server_config())
        .session_config(cli.session_config())
        .build(store)
        .await?;

    let (http, ws) = server.local_addrs()?;
    tracing::info!(%http, %ws, "tictac server ready");
    server.run().await
}
