//! Inbound chat platform events.

use serde::{Deserialize, Deserializer, Serialize};

use super::ChannelRef;

/// An event delivered by the chat platform.
///
/// Only the fields the relay reads are modeled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Event type tag (e.g. `ai_indicator.stop`, `message.new`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Combined channel id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Message the event targets (stop events carry this).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<EventMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<EventUser>,
}

/// Message payload embedded in an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<EventUser>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ai_generated: bool,
}

/// User payload embedded in an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUser {
    pub id: String,
}

impl ChatEvent {
    /// Control event asking the relay to stop generating.
    pub const STOP_GENERATING: &'static str = "ai_indicator.stop";

    /// A new message was posted in a channel.
    pub const MESSAGE_NEW: &'static str = "message.new";

    /// Creates an event with only a type.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            cid: None,
            channel_type: None,
            channel_id: None,
            message_id: None,
            message: None,
            user: None,
        }
    }

    /// Creates a stop-generating event targeting one message.
    pub fn stop_generating(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            ..Self::new(Self::STOP_GENERATING)
        }
    }

    /// Returns true if the event names the given message.
    pub fn targets_message(&self, message_id: &str) -> bool {
        self.message_id.as_deref() == Some(message_id)
    }

    /// Resolves the channel from explicit fields or the combined id.
    pub fn channel(&self) -> Option<ChannelRef> {
        match (&self.channel_type, &self.channel_id) {
            (Some(channel_type), Some(channel_id)) => {
                Some(ChannelRef::new(channel_type.clone(), channel_id.clone()))
            }
            _ => self.cid.as_deref().and_then(ChannelRef::from_cid),
        }
    }

    /// Id of the user who authored the event's message, if any.
    pub fn author_id(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
            .map(|u| u.id.as_str())
    }
}

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
