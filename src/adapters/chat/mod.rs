//! Chat platform adapters.
//!
//! - `StreamChatClient` - Production REST client
//! - `WebhookVerifier` - Signature check for inbound webhook deliveries
//! - `InMemoryChatPlatform` - Recording fake for tests

mod in_memory;
mod stream_chat;
mod webhook;

pub use in_memory::{InMemoryChatPlatform, RecordedUpdate};
pub use stream_chat::{server_token, StreamChatClient, StreamChatConfig};
pub use webhook::{hex_encode, WebhookError, WebhookVerifier, SIGNATURE_HEADER};
