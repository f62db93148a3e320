//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay to external systems:
//! - `ai` - Assistant providers (OpenAI Assistants, scripted mock)
//! - `chat` - Chat platform clients (Stream Chat REST, in-memory) and webhook verification
//! - `search` - Web search (Tavily)
//! - `http` - Axum routes for liveness, webhooks and agent lifecycle

pub mod ai;
pub mod chat;
pub mod http;
pub mod search;
