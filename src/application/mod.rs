//! Application layer - Handlers and agents.
//!
//! This layer orchestrates domain state and coordinates between ports.

pub mod agents;
pub mod handlers;

pub use agents::{AgentFactory, AgentRegistry, OpenAIAgent};
pub use handlers::{DisposeCallback, RelayError, ResponseRelay};
