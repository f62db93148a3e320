//! Assistant run vocabulary.
//!
//! Provider-neutral shapes of the events a streaming assistant run emits,
//! plus the tool calls a run can ask the relay to answer.

mod stream_event;
mod tool;

pub use stream_event::{AssistantStreamEvent, ContentDelta, MessageContent, StepKind};
pub use tool::{ToolCall, ToolOutput, WebSearchArguments, WEB_SEARCH_TOOL};
