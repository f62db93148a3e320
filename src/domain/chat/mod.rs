//! Chat platform vocabulary.
//!
//! Channels, messages, and the two event directions:
//! - `ChatEvent` - inbound events delivered by the platform (webhooks)
//! - `ChannelEvent` - outbound indicator events the relay emits to a channel

mod event;
mod indicator;
mod message;

pub use event::{ChatEvent, EventMessage, EventUser};
pub use indicator::{AiState, ChannelEvent};
pub use message::{ChannelRef, ChatMessage, NewMessage};
