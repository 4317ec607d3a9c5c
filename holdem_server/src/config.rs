//! Server configuration: environment variables with CLI overrides.

use std::net::SocketAddr;
use std::str::FromStr;

use holdem_core::RoomConfig;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Complete server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// HTTP/WebSocket bind address.
    pub bind: SocketAddr,
    /// Defaults applied to `CREATE_ROOM` when the client omits a field.
    pub room_defaults: RoomConfig,
}

impl ServerConfig {
    /// Load configuration, preferring CLI overrides, then environment
    /// variables, then built-in defaults.
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, String> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let raw =
                    std::env::var("SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
                raw.parse()
                    .map_err(|_| format!("invalid SERVER_BIND address: {raw}"))?
            }
        };

        let base = RoomConfig::default();
        let room_defaults = RoomConfig {
            initial_chips: parse_env_or("HOLDEM_INITIAL_CHIPS", base.initial_chips),
            small_blind: parse_env_or("HOLDEM_SMALL_BLIND", base.small_blind),
            big_blind: parse_env_or("HOLDEM_BIG_BLIND", base.big_blind),
            max_players: parse_env_or("HOLDEM_MAX_PLAYERS", base.max_players),
            turn_timeout_seconds: parse_env_or(
                "HOLDEM_TURN_TIMEOUT_SECS",
                base.turn_timeout_seconds,
            ),
            inter_hand_delay_seconds: parse_env_or(
                "HOLDEM_INTER_HAND_DELAY_SECS",
                base.inter_hand_delay_seconds,
            ),
        };
        room_defaults
            .validate()
            .map_err(|e| format!("invalid room defaults: {}", e.message))?;

        Ok(Self {
            bind,
            room_defaults,
        })
    }
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
