//! Response relay handler.
//!
//! Bridges one streaming assistant run to one chat message. The relay owns a
//! [`RelaySession`] and is driven by a single task, so handlers take
//! `&mut self` and no locks guard the session.
//!
//! # Lifecycle
//!
//! ```text
//! new()  -> subscribes to `ai_indicator.stop`
//! run()  -> select { shutdown, stop events, provider stream }
//!        -> Completed | Stopped | Errored
//!        -> dispose() (unsubscribe, owner callback; at most once)
//! ```
//!
//! Partial updates are throttled: a delta only triggers a write when at
//! least [`FLUSH_INTERVAL`](crate::domain::relay::FLUSH_INTERVAL) has passed
//! since the last write (or since the session started).

use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::assistant::{
    AssistantStreamEvent, ContentDelta, MessageContent, StepKind, ToolCall, ToolOutput,
    WebSearchArguments, WEB_SEARCH_TOOL,
};
use crate::domain::chat::{ChannelEvent, ChannelRef, ChatEvent, ChatMessage};
use crate::domain::relay::{RelaySession, SessionState};
use crate::ports::{
    search_error_envelope, AIError, AssistantEventStream, AssistantProvider, ChatError,
    ChatPlatform, SearchError, Subscription, WebSearch,
};

/// Owner cleanup invoked once when the relay is disposed.
pub type DisposeCallback = Box<dyn FnOnce() + Send + Sync>;

/// Errors raised while processing a run.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error(transparent)]
    Provider(#[from] AIError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("assistant stream ended before the run completed")]
    StreamEnded,
}

/// Relays one assistant run into one chat message.
pub struct ResponseRelay {
    chat: Arc<dyn ChatPlatform>,
    provider: Arc<dyn AssistantProvider>,
    web_search: Option<Arc<dyn WebSearch>>,
    thread_id: String,
    channel: ChannelRef,
    message: ChatMessage,
    session: RelaySession,
    subscription: Option<Subscription>,
    on_dispose: Option<DisposeCallback>,
    shutdown: CancellationToken,
}

impl ResponseRelay {
    /// Binds the relay to a message and registers the stop listener.
    ///
    /// The flush timer starts now.
    pub fn new(
        chat: Arc<dyn ChatPlatform>,
        provider: Arc<dyn AssistantProvider>,
        thread_id: impl Into<String>,
        channel: ChannelRef,
        message: ChatMessage,
        on_dispose: DisposeCallback,
    ) -> Self {
        let subscription = chat.subscribe(ChatEvent::STOP_GENERATING);
        tracing::debug!(message_id = %message.id, cid = %channel, "Response relay started");

        Self {
            chat,
            provider,
            web_search: None,
            thread_id: thread_id.into(),
            channel,
            message,
            session: RelaySession::new(now()),
            subscription: Some(subscription),
            on_dispose: Some(on_dispose),
            shutdown: CancellationToken::new(),
        }
    }

    /// Enables answering `web_search` tool calls.
    pub fn with_web_search(mut self, web_search: Arc<dyn WebSearch>) -> Self {
        self.web_search = Some(web_search);
        self
    }

    /// Token the owner cancels to shut the relay down.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn message(&self) -> &ChatMessage {
        &self.message
    }

    pub fn session(&self) -> &RelaySession {
        &self.session
    }

    pub fn is_disposed(&self) -> bool {
        self.session.is_disposed()
    }

    /// Drives the session until it is finalized and returns its outcome.
    pub async fn run(mut self, stream: AssistantEventStream) -> SessionState {
        let shutdown = self.shutdown.clone();
        let mut stream = stream;

        while !self.session.is_finalized() {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::info!(message_id = %self.message.id, "Relay shutdown requested");
                    self.stop_generation().await;
                }
                event = next_control_event(&mut self.subscription) => {
                    self.handle_stop_requested(&event).await;
                }
                item = stream.next() => match item {
                    Some(Ok(event)) => match self.handle_stream_event(event).await {
                        Ok(Some(continuation)) => stream = continuation,
                        Ok(None) => {}
                        Err(error) => self.handle_error(&error).await,
                    },
                    Some(Err(error)) => self.handle_error(&RelayError::from(error)).await,
                    None => self.handle_error(&RelayError::StreamEnded).await,
                },
            }
        }

        self.dispose();
        self.session.state()
    }

    /// Reacts to a stop-generating event.
    ///
    /// Ignored once finalized or when the event targets another message.
    pub async fn handle_stop_requested(&mut self, event: &ChatEvent) {
        if self.session.is_finalized() || !event.targets_message(&self.message.id) {
            return;
        }
        tracing::info!(message_id = %self.message.id, "Stopping generation");
        self.stop_generation().await;
    }

    async fn stop_generation(&mut self) {
        if self.session.is_finalized() {
            return;
        }
        self.cancel_run().await;
        self.send_indicator(ChannelEvent::clear(&self.message)).await;
        self.session.stop();
        self.dispose();
    }

    /// Sends an indicator event. Failures are logged, not propagated.
    async fn send_indicator(&self, event: ChannelEvent) {
        let event_type = event.event_type();
        if let Err(error) = self.chat.send_channel_event(&self.channel, event).await {
            tracing::warn!(
                message_id = %self.message.id,
                event_type,
                error = %error,
                "Failed to send AI indicator"
            );
        }
    }

    /// Requests cancellation of the run. Failures are logged, not propagated.
    async fn cancel_run(&self) {
        let Some(run_id) = self.session.run_id() else {
            tracing::debug!(message_id = %self.message.id, "Run id unknown, nothing to cancel");
            return;
        };
        if let Err(error) = self.provider.cancel_run(&self.thread_id, run_id).await {
            tracing::warn!(run_id, error = %error, "Failed to cancel run");
        }
    }

    /// Applies one provider event.
    ///
    /// Returns a continuation stream when tool outputs were submitted.
    pub async fn handle_stream_event(
        &mut self,
        event: AssistantStreamEvent,
    ) -> Result<Option<AssistantEventStream>, RelayError> {
        if self.session.is_finalized() {
            tracing::trace!(kind = event.kind(), "Ignoring event after finalization");
            return Ok(None);
        }

        match event {
            AssistantStreamEvent::RunCreated { run_id } => {
                tracing::debug!(run_id = %run_id, message_id = %self.message.id, "Run created");
                self.session.set_run_id(run_id);
            }
            AssistantStreamEvent::MessageDelta { content } => {
                let fragment: String = content
                    .into_iter()
                    .filter_map(|part| match part {
                        ContentDelta::Text(text) => Some(text),
                        ContentDelta::Other(_) => None,
                    })
                    .collect();
                if fragment.is_empty() {
                    return Ok(None);
                }
                if let Some(snapshot) = self.session.append(&fragment, now()) {
                    tracing::debug!(message_id = %self.message.id, chars = snapshot.len(), "Flushing partial text");
                    self.chat
                        .partial_update_text(&self.message.id, &snapshot)
                        .await?;
                }
            }
            AssistantStreamEvent::RunCompleted { content, .. } => {
                let final_text = match content.into_iter().next() {
                    Some(MessageContent::Text(text)) => text,
                    _ => self.session.text().to_string(),
                };
                self.chat
                    .partial_update_text(&self.message.id, &final_text)
                    .await?;
                // The reply is delivered; a lost clear must not overwrite it.
                self.send_indicator(ChannelEvent::clear(&self.message)).await;
                tracing::info!(message_id = %self.message.id, chars = final_text.len(), "Run completed");
                self.session.complete();
                self.dispose();
            }
            AssistantStreamEvent::RunStepCreated { step, .. } => {
                if step == StepKind::MessageCreation {
                    self.send_indicator(ChannelEvent::generating(&self.message)).await;
                }
            }
            AssistantStreamEvent::RequiresAction { run_id, tool_calls } => {
                if self.session.run_id().is_none() {
                    self.session.set_run_id(run_id.clone());
                }
                let outputs = self.answer_tool_calls(&tool_calls).await?;
                let continuation = self
                    .provider
                    .submit_tool_outputs(&self.thread_id, &run_id, outputs)
                    .await?;
                return Ok(Some(continuation));
            }
        }

        Ok(None)
    }

    async fn answer_tool_calls(&self, calls: &[ToolCall]) -> Result<Vec<ToolOutput>, RelayError> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let output = if call.name == WEB_SEARCH_TOOL {
                match serde_json::from_str::<WebSearchArguments>(&call.arguments) {
                    Ok(arguments) => self.perform_web_search(&arguments.query).await?,
                    Err(e) => search_error_envelope("Invalid web_search arguments", e.to_string()),
                }
            } else {
                tracing::warn!(tool = %call.name, "Unknown tool requested");
                search_error_envelope(format!("Unknown tool: {}", call.name), call.name.clone())
            };
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        Ok(outputs)
    }

    /// Runs a web search. Only a missing credential is an error.
    pub async fn perform_web_search(&self, query: &str) -> Result<String, RelayError> {
        let web_search = self.web_search.as_ref().ok_or(SearchError::MissingApiKey)?;
        Ok(web_search.search(query).await?)
    }

    /// Reports an error in the message and channel, then disposes.
    pub async fn handle_error(&mut self, error: &RelayError) {
        if self.session.is_finalized() {
            return;
        }
        let description = error.to_string();
        tracing::error!(message_id = %self.message.id, error = %description, "Relay error");

        if let Err(e) = self
            .chat
            .send_channel_event(
                &self.channel,
                ChannelEvent::error(&self.message, description.clone()),
            )
            .await
        {
            tracing::warn!(error = %e, "Failed to send error indicator");
        }
        if let Err(e) = self
            .chat
            .partial_update_text(&self.message.id, &description)
            .await
        {
            tracing::warn!(error = %e, "Failed to write error into message");
        }

        self.session.fail();
        self.dispose();
    }

    /// Finalizes the relay. Returns true only on the first call.
    pub fn dispose(&mut self) -> bool {
        if !self.session.dispose() {
            return false;
        }
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(on_dispose) = self.on_dispose.take() {
            on_dispose();
        }
        tracing::debug!(message_id = %self.message.id, state = ?self.session.state(), "Response relay disposed");
        true
    }
}

/// Next stop event, or never once the subscription is gone.
async fn next_control_event(subscription: &mut Option<Subscription>) -> ChatEvent {
    if let Some(subscription) = subscription.as_mut() {
        if let Some(event) = subscription.recv().await {
            return event;
        }
    }
    std::future::pending().await
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
