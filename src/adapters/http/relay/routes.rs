//! Axum router configuration for relay endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, receive_webhook, start_agent, stop_agent, RelayAppState};

/// Create the relay router.
///
/// # Routes
///
/// - `GET /` - Liveness text
/// - `POST /webhooks/chat` - Signed chat platform webhook deliveries
/// - `POST /agents/start` - Start an agent for a channel
/// - `POST /agents/stop` - Stop a channel's agent
pub fn relay_routes() -> Router<RelayAppState> {
    Router::new()
        .route("/", get(health))
        // Inbound chat events
        .route("/webhooks/chat", post(receive_webhook))
        // Agent lifecycle
        .route("/agents/start", post(start_agent))
        .route("/agents/stop", post(stop_agent))
}

/// Create the relay router with its state applied.
pub fn relay_router(state: RelayAppState) -> Router {
    relay_routes().with_state(state)
}
