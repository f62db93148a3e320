//! Agent platforms and per-platform state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::chat::ChannelRef;

/// Backend that powers an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgentPlatform {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "writing_assistant")]
    WritingAssistant,
}

impl AgentPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::WritingAssistant => "writing_assistant",
        }
    }
}

impl fmt::Display for AgentPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform name that matches no known agent platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown agent platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for AgentPlatform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "writing_assistant" => Ok(Self::WritingAssistant),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

/// Who the agent speaks as, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBinding {
    /// Bot user the agent posts as.
    pub user_id: String,
    /// Channel the agent serves.
    pub channel: ChannelRef,
}

impl AgentBinding {
    pub fn new(user_id: impl Into<String>, channel: ChannelRef) -> Self {
        Self {
            user_id: user_id.into(),
            channel,
        }
    }

    /// Binding with the conventional bot user id for the channel.
    pub fn for_channel(channel: ChannelRef) -> Self {
        let user_id = format!("ai-bot-{}", channel.channel_id);
        Self::new(user_id, channel)
    }
}

/// Platform-specific agent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum AgentState {
    #[serde(rename = "openai")]
    OpenAi {
        assistant_id: String,
        /// Provider thread, present once the agent is initialized.
        thread_id: Option<String>,
    },
    WritingAssistant { writing_task: Option<String> },
}

impl AgentState {
    pub fn platform(&self) -> AgentPlatform {
        match self {
            Self::OpenAi { .. } => AgentPlatform::OpenAi,
            Self::WritingAssistant { .. } => AgentPlatform::WritingAssistant,
        }
    }
}
