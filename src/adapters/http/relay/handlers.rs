//! HTTP handlers for relay endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::chat::{WebhookVerifier, SIGNATURE_HEADER};
use crate::application::AgentRegistry;
use crate::domain::agent::AgentPlatform;
use crate::domain::chat::ChatEvent;
use crate::ports::{AgentError, ChatEventHub};

use super::dto::{AgentRequest, AgentResponse, ErrorResponse, WebhookAck};

/// Liveness text served at `/`.
pub const LIVENESS_TEXT: &str = "Stream Chat Backend is running!";

/// Application state for relay endpoints.
#[derive(Clone)]
pub struct RelayAppState {
    /// Hub that webhook deliveries are published into
    pub event_hub: Arc<ChatEventHub>,
    /// Signature check for webhooks; `None` accepts unsigned deliveries
    pub webhook_verifier: Option<Arc<WebhookVerifier>>,
    /// Running channel agents
    pub agents: Arc<AgentRegistry>,
}

/// Liveness check.
///
/// GET /
pub async fn health() -> &'static str {
    LIVENESS_TEXT
}

/// Receive a chat platform webhook.
///
/// POST /webhooks/chat
pub async fn receive_webhook(
    State(state): State<RelayAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(verifier) = &state.webhook_verifier {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        if let Err(error) = verifier.verify(&body, signature) {
            tracing::warn!(error = %error, "Rejected webhook delivery");
            return (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(error.to_string())))
                .into_response();
        }
    }

    let event: ChatEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(error = %error, "Unparseable webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("invalid event: {}", error))),
            )
                .into_response();
        }
    };

    let listeners = state.event_hub.publish(event.clone());
    tracing::debug!(
        event_type = %event.event_type,
        cid = event.cid.as_deref().unwrap_or_default(),
        listeners,
        "Webhook event published"
    );

    let dispatched = match state.agents.dispatch(&event).await {
        Ok(dispatched) => dispatched,
        Err(error) => {
            tracing::error!(
                cid = event.cid.as_deref().unwrap_or_default(),
                error = %error,
                "Agent failed to handle message"
            );
            false
        }
    };

    (
        StatusCode::OK,
        Json(WebhookAck {
            received: true,
            event_type: event.event_type,
            dispatched,
        }),
    )
        .into_response()
}

/// Start an agent for a channel.
///
/// POST /agents/start
pub async fn start_agent(
    State(state): State<RelayAppState>,
    Json(request): Json<AgentRequest>,
) -> Response {
    let Some(channel) = request.channel() else {
        return bad_request("channel_type and channel_id are required");
    };
    let platform = match request.platform.as_deref() {
        None => AgentPlatform::default(),
        Some(name) => match name.parse::<AgentPlatform>() {
            Ok(platform) => platform,
            Err(error) => return bad_request(error.to_string()),
        },
    };

    let cid = channel.cid();
    match state.agents.start(platform, channel).await {
        Ok(_) => (
            StatusCode::OK,
            Json(AgentResponse {
                message: "AI Agent started".to_string(),
                cid,
            }),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(cid = %cid, platform = %platform, error = %error, "Failed to start agent");
            (agent_error_status(&error), Json(ErrorResponse::new(error.to_string())))
                .into_response()
        }
    }
}

/// Stop a channel's agent.
///
/// POST /agents/stop
pub async fn stop_agent(
    State(state): State<RelayAppState>,
    Json(request): Json<AgentRequest>,
) -> Response {
    let Some(channel) = request.channel() else {
        return bad_request("channel_type and channel_id are required");
    };

    let cid = channel.cid();
    match state.agents.stop(&channel).await {
        Ok(stopped) => {
            let message = if stopped {
                "AI Agent stopped"
            } else {
                "No AI Agent running"
            };
            (
                StatusCode::OK,
                Json(AgentResponse {
                    message: message.to_string(),
                    cid,
                }),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(cid = %cid, error = %error, "Failed to stop agent");
            (agent_error_status(&error), Json(ErrorResponse::new(error.to_string())))
                .into_response()
        }
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

/// Maps agent errors to HTTP status codes.
pub fn agent_error_status(error: &AgentError) -> StatusCode {
    match error {
        AgentError::UnsupportedPlatform(_) => StatusCode::BAD_REQUEST,
        AgentError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        AgentError::Provider(_) | AgentError::Chat(_) => StatusCode::BAD_GATEWAY,
        AgentError::NotInitialized | AgentError::Disposed => StatusCode::CONFLICT,
    }
}
