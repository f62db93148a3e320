//! AI indicator events sent to a channel.
//!
//! Indicators are advisory UI state; they are never stored as message content.

use serde::{Deserialize, Serialize};

use super::ChatMessage;

/// State shown by an `ai_indicator.update` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    #[serde(rename = "AI_STATE_GENERATING")]
    Generating,
    #[serde(rename = "AI_STATE_ERROR")]
    Error,
}

/// Outbound channel event emitted by a relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ChannelEvent {
    #[serde(rename = "ai_indicator.update")]
    AiIndicatorUpdate {
        ai_state: AiState,
        cid: String,
        message_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "ai_indicator.clear")]
    AiIndicatorClear { cid: String, message_id: String },
}

impl ChannelEvent {
    /// The assistant started writing the given message.
    pub fn generating(message: &ChatMessage) -> Self {
        Self::AiIndicatorUpdate {
            ai_state: AiState::Generating,
            cid: message.cid.clone(),
            message_id: message.id.clone(),
            error: None,
        }
    }

    /// Generation of the given message failed.
    pub fn error(message: &ChatMessage, error: impl Into<String>) -> Self {
        Self::AiIndicatorUpdate {
            ai_state: AiState::Error,
            cid: message.cid.clone(),
            message_id: message.id.clone(),
            error: Some(error.into()),
        }
    }

    /// Clears any indicator on the given message.
    pub fn clear(message: &ChatMessage) -> Self {
        Self::AiIndicatorClear {
            cid: message.cid.clone(),
            message_id: message.id.clone(),
        }
    }

    /// Wire type tag of the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AiIndicatorUpdate { .. } => "ai_indicator.update",
            Self::AiIndicatorClear { .. } => "ai_indicator.clear",
        }
    }

    /// Message the indicator refers to.
    pub fn message_id(&self) -> &str {
        match self {
            Self::AiIndicatorUpdate { message_id, .. } | Self::AiIndicatorClear { message_id, .. } => {
                message_id.as_str()
            }
        }
    }
}
