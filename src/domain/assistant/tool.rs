//! Tool calls requested by an assistant run.

use serde::{Deserialize, Serialize};

/// Name of the function tool that triggers web search augmentation.
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// A function call the run is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Provider id of the call, echoed back in the output.
    pub id: String,
    /// Function name.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Result submitted back to the run for one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Arguments of the `web_search` tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebSearchArguments {
    pub query: String,
}
