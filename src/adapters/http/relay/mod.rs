//! Relay HTTP adapter - liveness, chat webhooks and agent lifecycle.
//!
//! Provides endpoints for:
//! - Liveness checks
//! - Receiving signed chat platform webhooks
//! - Starting and stopping channel agents

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;

pub use handlers::{RelayAppState, LIVENESS_TEXT};
pub use routes::{relay_router, relay_routes};
