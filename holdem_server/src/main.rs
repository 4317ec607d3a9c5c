//! Multi-room Texas Hold'em WebSocket server.
//!
//! Rooms live in memory and each is driven by its own actor task; this
//! binary provides the connection gateway, configuration, and logging.

mod api;
mod config;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;

use holdem_core::RoomManager;

use config::ServerConfig;

const HELP: &str = "\
Run a multi-room Texas Hold'em server

USAGE:
  holdem_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                    Server bind address (e.g. 0.0.0.0:8080)
  HOLDEM_INITIAL_CHIPS           Default starting stack per seat
  HOLDEM_SMALL_BLIND             Default small blind
  HOLDEM_BIG_BLIND               Default big blind
  HOLDEM_MAX_PLAYERS             Default seats per room (2-9)
  HOLDEM_TURN_TIMEOUT_SECS       Per-turn action timeout
  HOLDEM_INTER_HAND_DELAY_SECS   Pause between hands
  RUST_LOG                       Log filter (e.g. info,holdem_core=debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env if present; existing variables win.
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    logging::init();

    let config = ServerConfig::from_env(bind_override)
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    tracing::info!("room defaults: {:?}", config.room_defaults);

    let state = api::AppState {
        manager: Arc::new(RoomManager::new()),
        room_defaults: config.room_defaults.clone(),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {e}", config.bind))?;
    tracing::info!(
        "server running at http://{} (WebSocket endpoint /ws), press ctrl-c to stop",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    tracing::info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
}
