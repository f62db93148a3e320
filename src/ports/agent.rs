//! Agent Port - Lifecycle contract for channel-bound AI agents.
//!
//! Every platform variant implements the same required operations; what is
//! specific to a platform is exposed through [`AgentState`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::agent::{AgentBinding, AgentPlatform, AgentState};

use super::{AIError, ChatError};

/// An AI agent serving one chat channel.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Platform backing this agent.
    fn platform(&self) -> AgentPlatform;

    /// Bot user and channel the agent is bound to.
    fn binding(&self) -> &AgentBinding;

    /// Snapshot of platform-specific state.
    fn state(&self) -> AgentState;

    /// When the agent last handled a user message.
    async fn last_interaction(&self) -> Option<DateTime<Utc>>;

    /// Prepares provider resources. Must be called before `handle_message`.
    async fn init(&self) -> Result<(), AgentError>;

    /// Answers a user message in the bound channel.
    async fn handle_message(&self, text: &str) -> Result<(), AgentError>;

    /// Shuts the agent down. Idempotent.
    async fn dispose(&self) -> Result<(), AgentError>;
}

/// Agent lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent platform not supported: {0}")]
    UnsupportedPlatform(AgentPlatform),

    #[error("agent platform not configured: {0} is not set")]
    NotConfigured(&'static str),

    #[error("agent is not initialized")]
    NotInitialized,

    #[error("agent has been disposed")]
    Disposed,

    #[error(transparent)]
    Provider(#[from] AIError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}
