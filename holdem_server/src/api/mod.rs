//! HTTP surface: the WebSocket upgrade endpoint and a health probe.

pub mod websocket;

use axum::{routing::get, Router};
use std::sync::Arc;

use holdem_core::{RoomConfig, RoomManager};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<RoomManager>,
    pub room_defaults: RoomConfig,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket::websocket_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
