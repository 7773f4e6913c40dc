//! HTTP/WebSocket gateway.

pub mod handlers;
pub mod response;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::websocket::ws_handler;
use state::AppState;

/// Build the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/transfer", post(handlers::create_transfer))
        .route("/api/v1/transfer/{id}", get(handlers::get_transfer))
        .route("/api/v1/history/{owner}", get(handlers::get_history))
        .route("/api/v1/balance/{owner}", get(handlers::get_balance))
        .route("/ws", get(ws_handler))
        .with_state(state)
}
