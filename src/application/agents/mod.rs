//! Channel-bound AI agents.
//!
//! - `OpenAIAgent` - Assistants-backed agent spawning one relay per message
//! - `AgentRegistry` - One running agent per channel, plus webhook dispatch

mod openai_agent;
mod registry;

pub use openai_agent::OpenAIAgent;
pub use registry::{AgentFactory, AgentRegistry};
