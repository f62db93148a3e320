//! Channels and messages on the chat platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A channel addressed by its type and id.
///
/// The platform's combined id (`cid`) is `"{channel_type}:{channel_id}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Channel type (e.g. "messaging").
    pub channel_type: String,
    /// Channel id within its type.
    pub channel_id: String,
}

impl ChannelRef {
    /// Creates a new channel reference.
    pub fn new(channel_type: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            channel_type: channel_type.into(),
            channel_id: channel_id.into(),
        }
    }

    /// Parses a combined `type:id` channel identifier.
    pub fn from_cid(cid: &str) -> Option<Self> {
        let (channel_type, channel_id) = cid.split_once(':')?;
        if channel_type.is_empty() || channel_id.is_empty() {
            return None;
        }
        Some(Self::new(channel_type, channel_id))
    }

    /// Returns the combined channel identifier.
    pub fn cid(&self) -> String {
        format!("{}:{}", self.channel_type, self.channel_id)
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_type, self.channel_id)
    }
}

/// A message that exists on the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Platform message id.
    pub id: String,
    /// Combined id of the channel holding the message.
    pub cid: String,
    /// Current text of the message.
    #[serde(default)]
    pub text: String,
}

impl ChatMessage {
    /// Creates a message reference.
    pub fn new(id: impl Into<String>, cid: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cid: cid.into(),
            text: text.into(),
        }
    }
}

/// A message to be created in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    /// Client-assigned message id.
    pub id: String,
    /// Initial text.
    pub text: String,
    /// Author of the message.
    pub user_id: String,
    /// Marks the message as produced by an AI.
    pub ai_generated: bool,
}

impl NewMessage {
    /// An empty AI-generated message that a relay will fill in.
    pub fn ai_placeholder(user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: String::new(),
            user_id: user_id.into(),
            ai_generated: true,
        }
    }
}
