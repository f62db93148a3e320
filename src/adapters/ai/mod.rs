//! AI Provider Adapters.
//!
//! Implementations of the AssistantProvider port.
//!
//! ## Available Adapters
//!
//! - `OpenAIAssistantsProvider` - OpenAI Assistants v2 with streaming runs
//! - `MockAssistantProvider` - Scripted mock for testing

mod mock_assistant;
mod openai_assistants;
mod sse;

pub use mock_assistant::{MockAssistantProvider, MockRun};
pub use openai_assistants::{OpenAIAssistantsConfig, OpenAIAssistantsProvider};
pub use sse::{SseDecoder, SseFrame};
