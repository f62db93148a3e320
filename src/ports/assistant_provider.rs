//! Assistant Provider Port - Interface for assistant-style streaming runs.
//!
//! Abstracts the thread/run model of hosted assistant APIs: a conversation
//! thread holds messages, a run executes an assistant over the thread and
//! streams [`AssistantStreamEvent`]s back.
//!
//! # Example
//!
//! ```ignore
//! let thread_id = provider.create_thread().await?;
//! provider.add_user_message(&thread_id, "Hello").await?;
//! let mut stream = provider.stream_run(&thread_id, "asst_123").await?;
//! while let Some(event) = stream.next().await {
//!     // feed the relay
//! }
//! ```

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::assistant::{AssistantStreamEvent, ToolOutput};

/// Stream of events for one run (or its continuation after tool outputs).
pub type AssistantEventStream =
    Pin<Box<dyn Stream<Item = Result<AssistantStreamEvent, AIError>> + Send>>;

/// Port for assistant provider interactions.
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Creates a new conversation thread and returns its id.
    async fn create_thread(&self) -> Result<String, AIError>;

    /// Appends a user message to a thread.
    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<(), AIError>;

    /// Starts a streaming run of `assistant_id` over the thread.
    async fn stream_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<AssistantEventStream, AIError>;

    /// Submits tool outputs for a paused run and streams its continuation.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<AssistantEventStream, AIError>;

    /// Requests cancellation of an in-flight run.
    ///
    /// Cancellation is cooperative: events may still arrive afterwards.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), AIError>;
}

/// AI provider errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Thread, run or assistant does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The run ended in a failed state.
    #[error("run failed: {0}")]
    RunFailed(String),
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn run_failed(message: impl Into<String>) -> Self {
        Self::RunFailed(message.into())
    }
}
