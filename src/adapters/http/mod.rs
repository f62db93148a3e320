//! HTTP adapters - REST API implementations.

pub mod relay;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use relay::{relay_router, RelayAppState};

/// Builds the application router with CORS and request tracing.
pub fn build_router(state: RelayAppState, server: &ServerConfig) -> Router {
    relay_router(state)
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
}

/// Permissive CORS unless origins are configured.
pub fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
