//! Chat Platform Port - Interface for server-side chat operations.
//!
//! Covers the writes a relay performs (partial message updates, channel
//! events, placeholder messages) and the inbound event subscription used to
//! receive `ai_indicator.stop`.
//!
//! # Subscriptions
//!
//! Inbound events flow through a [`ChatEventHub`]. A relay takes a
//! [`Subscription`] for one event type when it starts and releases it exactly
//! once when it is disposed; dropping the handle releases it as well.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::domain::chat::{ChannelEvent, ChannelRef, ChatEvent, ChatMessage, NewMessage};

/// Port for chat platform interactions.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Sets the text field of an existing message.
    async fn partial_update_text(&self, message_id: &str, text: &str) -> Result<(), ChatError>;

    /// Sends an ephemeral event to a channel.
    async fn send_channel_event(
        &self,
        channel: &ChannelRef,
        event: ChannelEvent,
    ) -> Result<(), ChatError>;

    /// Creates a message in a channel.
    async fn send_message(
        &self,
        channel: &ChannelRef,
        message: NewMessage,
    ) -> Result<ChatMessage, ChatError>;

    /// Registers a listener for one inbound event type.
    fn subscribe(&self, event_type: &str) -> Subscription;
}

/// Chat platform errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    /// API key or secret absent.
    #[error("STREAM_API_KEY and STREAM_API_SECRET must be set")]
    MissingCredentials,

    /// Server token could not be signed.
    #[error("failed to sign server token: {0}")]
    Token(String),

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// The platform rejected the request.
    #[error("chat API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Failed to parse platform response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ChatError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

type ListenerTable = Arc<Mutex<HashMap<u64, String>>>;

fn lock_table(table: &ListenerTable) -> MutexGuard<'_, HashMap<u64, String>> {
    // Entries are plain strings, so a poisoned table is still consistent.
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process fan-out of inbound chat events.
///
/// Webhook deliveries are published here; relays subscribe per event type.
pub struct ChatEventHub {
    sender: broadcast::Sender<ChatEvent>,
    listeners: ListenerTable,
    next_id: AtomicU64,
}

impl ChatEventHub {
    /// Default number of buffered events per subscriber.
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Publishes an event; returns how many listeners are registered for its type.
    pub fn publish(&self, event: ChatEvent) -> usize {
        let interested = self.listener_count(&event.event_type);
        // No receivers is not an error for a fan-out hub.
        let _ = self.sender.send(event);
        interested
    }

    /// Registers a listener for `event_type`.
    pub fn subscribe(&self, event_type: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock_table(&self.listeners).insert(id, event_type.to_string());
        tracing::debug!(subscription_id = id, event_type, "Chat event listener registered");

        Subscription {
            id,
            event_type: event_type.to_string(),
            receiver: self.sender.subscribe(),
            listeners: Arc::clone(&self.listeners),
            active: true,
        }
    }

    /// Number of live listeners for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        lock_table(&self.listeners)
            .values()
            .filter(|registered| registered.as_str() == event_type)
            .count()
    }
}

impl Default for ChatEventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped registration for one inbound event type.
pub struct Subscription {
    id: u64,
    event_type: String,
    receiver: broadcast::Receiver<ChatEvent>,
    listeners: ListenerTable,
    active: bool,
}

impl Subscription {
    /// Waits for the next event of the subscribed type.
    ///
    /// Returns `None` once unsubscribed or when the hub is gone.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        while self.active {
            match self.receiver.recv().await {
                Ok(event) if event.event_type == self.event_type => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        subscription_id = self.id,
                        skipped,
                        "Chat event listener lagged"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
        None
    }

    /// Releases the registration. Returns true only on the first call.
    pub fn unsubscribe(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        lock_table(&self.listeners).remove(&self.id);
        tracing::debug!(subscription_id = self.id, event_type = %self.event_type, "Chat event listener removed");
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("active", &self.active)
            .finish()
    }
}
