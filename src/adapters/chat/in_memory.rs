//! In-memory chat platform for testing.
//!
//! Records every write a relay performs so tests can assert on the exact
//! sequence of partial updates and indicator events.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio::time::Instant;

use crate::domain::chat::{ChannelEvent, ChannelRef, ChatEvent, ChatMessage, NewMessage};
use crate::ports::{ChatError, ChatEventHub, ChatPlatform, Subscription};

/// A recorded partial message update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpdate {
    pub message_id: String,
    pub text: String,
    pub at: Instant,
}

/// In-memory chat platform.
///
/// # Example
///
/// ```ignore
/// let chat = Arc::new(InMemoryChatPlatform::new());
/// chat.emit(ChatEvent::stop_generating("msg-1"));
/// assert_eq!(chat.update_texts(), vec!["partial"]);
/// ```
pub struct InMemoryChatPlatform {
    hub: Arc<ChatEventHub>,
    updates: RwLock<Vec<RecordedUpdate>>,
    events: RwLock<Vec<(ChannelRef, ChannelEvent)>>,
    messages: RwLock<Vec<(ChannelRef, NewMessage)>>,
    fail_updates: RwLock<Option<ChatError>>,
    fail_events: RwLock<Option<ChatError>>,
}

impl InMemoryChatPlatform {
    pub fn new() -> Self {
        Self::with_hub(Arc::new(ChatEventHub::new()))
    }

    /// Shares an existing hub, e.g. one that an HTTP layer publishes into.
    pub fn with_hub(hub: Arc<ChatEventHub>) -> Self {
        Self {
            hub,
            updates: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
            messages: RwLock::new(Vec::new()),
            fail_updates: RwLock::new(None),
            fail_events: RwLock::new(None),
        }
    }

    /// Makes every subsequent `partial_update_text` fail with `error`.
    pub fn fail_updates(&self, error: ChatError) {
        *self
            .fail_updates
            .write()
            .expect("InMemoryChatPlatform: fail_updates lock poisoned") = Some(error);
    }

    /// Makes every subsequent `send_channel_event` fail with `error`.
    pub fn fail_events(&self, error: ChatError) {
        *self
            .fail_events
            .write()
            .expect("InMemoryChatPlatform: fail_events lock poisoned") = Some(error);
    }

    // === Test Helpers ===

    /// Delivers an inbound event to subscribers.
    pub fn emit(&self, event: ChatEvent) -> usize {
        self.hub.publish(event)
    }

    pub fn event_hub(&self) -> Arc<ChatEventHub> {
        Arc::clone(&self.hub)
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.hub.listener_count(event_type)
    }

    /// All recorded partial updates in call order.
    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates
            .read()
            .expect("InMemoryChatPlatform: updates lock poisoned")
            .clone()
    }

    /// Texts of the recorded partial updates in call order.
    pub fn update_texts(&self) -> Vec<String> {
        self.updates().into_iter().map(|u| u.text).collect()
    }

    /// All recorded channel events in call order.
    pub fn channel_events(&self) -> Vec<(ChannelRef, ChannelEvent)> {
        self.events
            .read()
            .expect("InMemoryChatPlatform: events lock poisoned")
            .clone()
    }

    /// All messages created through `send_message`.
    pub fn sent_messages(&self) -> Vec<(ChannelRef, NewMessage)> {
        self.messages
            .read()
            .expect("InMemoryChatPlatform: messages lock poisoned")
            .clone()
    }
}

impl Default for InMemoryChatPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatPlatform for InMemoryChatPlatform {
    async fn partial_update_text(&self, message_id: &str, text: &str) -> Result<(), ChatError> {
        if let Some(error) = self
            .fail_updates
            .read()
            .expect("InMemoryChatPlatform: fail_updates lock poisoned")
            .clone()
        {
            return Err(error);
        }
        self.updates
            .write()
            .expect("InMemoryChatPlatform: updates lock poisoned")
            .push(RecordedUpdate {
                message_id: message_id.to_string(),
                text: text.to_string(),
                at: Instant::now(),
            });
        Ok(())
    }

    async fn send_channel_event(
        &self,
        channel: &ChannelRef,
        event: ChannelEvent,
    ) -> Result<(), ChatError> {
        if let Some(error) = self
            .fail_events
            .read()
            .expect("InMemoryChatPlatform: fail_events lock poisoned")
            .clone()
        {
            return Err(error);
        }
        self.events
            .write()
            .expect("InMemoryChatPlatform: events lock poisoned")
            .push((channel.clone(), event));
        Ok(())
    }

    async fn send_message(
        &self,
        channel: &ChannelRef,
        message: NewMessage,
    ) -> Result<ChatMessage, ChatError> {
        let created = ChatMessage::new(message.id.clone(), channel.cid(), message.text.clone());
        self.messages
            .write()
            .expect("InMemoryChatPlatform: messages lock poisoned")
            .push((channel.clone(), message));
        Ok(created)
    }

    fn subscribe(&self, event_type: &str) -> Subscription {
        self.hub.subscribe(event_type)
    }
}
