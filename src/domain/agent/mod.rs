//! Agent domain types.
//!
//! An agent is bound to one channel and one bot user. What differs between
//! platforms lives in the `AgentState` variant payload rather than in
//! optional fields on a shared struct.

mod platform;
mod writing;

pub use platform::{AgentBinding, AgentPlatform, AgentState, UnknownPlatform};
pub use writing::{WritingCustom, WritingMessage, WritingMessageType};
