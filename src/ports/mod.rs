//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay and the outside world. Adapters implement these ports.
//!
//! - `ChatPlatform` - Server-side chat writes and inbound event subscriptions
//! - `AssistantProvider` - Threads, streaming runs, cancellation, tool outputs
//! - `WebSearch` - Search augmentation for tool calls
//! - `ChatAgent` - Lifecycle contract for channel-bound agents

mod agent;
mod assistant_provider;
mod chat_platform;
mod web_search;

pub use agent::{AgentError, ChatAgent};
pub use assistant_provider::{AIError, AssistantEventStream, AssistantProvider};
pub use chat_platform::{ChatError, ChatEventHub, ChatPlatform, Subscription};
pub use web_search::{search_error_envelope, SearchDepth, SearchError, SearchParameters, WebSearch};
