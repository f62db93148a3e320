//! Request and response DTOs for relay endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::chat::ChannelRef;

// ════════════════════════════════════════════════════════════════════════════════
// Webhook DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement returned for an accepted webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub event_type: String,
    /// Whether a channel agent was asked to answer.
    pub dispatched: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Agent DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start or stop a channel agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub channel_type: String,
    pub channel_id: String,
    /// Platform name; defaults to `openai`. Ignored by stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl AgentRequest {
    /// Channel addressed by the request, if both parts are present.
    pub fn channel(&self) -> Option<ChannelRef> {
        if self.channel_type.trim().is_empty() || self.channel_id.trim().is_empty() {
            return None;
        }
        Some(ChannelRef::new(
            self.channel_type.trim(),
            self.channel_id.trim(),
        ))
    }
}

/// Response for agent lifecycle requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub message: String,
    pub cid: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Common DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_request_platform_is_optional() {
        let request: AgentRequest =
            serde_json::from_str(r#"{"channel_type":"messaging","channel_id":"general"}"#).unwrap();

        assert!(request.platform.is_none());
        assert_eq!(
            request.channel(),
            Some(ChannelRef::new("messaging", "general"))
        );
    }

    #[test]
    fn blank_channel_parts_are_rejected() {
        let request = AgentRequest {
            channel_type: "messaging".to_string(),
            channel_id: "  ".to_string(),
            platform: None,
        };
        assert!(request.channel().is_none());
    }
}
