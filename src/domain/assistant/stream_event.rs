//! Events emitted by a streaming assistant run.

/// One event from a provider's run stream.
///
/// Adapters translate their wire events into this union and drop the kinds
/// the relay has no use for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantStreamEvent {
    /// The provider accepted the run and assigned it an id.
    RunCreated { run_id: String },
    /// An incremental piece of the assistant message.
    MessageDelta { content: Vec<ContentDelta> },
    /// The run finished; `content` holds the final message parts when the
    /// provider includes them.
    RunCompleted {
        run_id: String,
        content: Vec<MessageContent>,
    },
    /// The run started a new step.
    RunStepCreated { run_id: String, step: StepKind },
    /// The run is paused until tool outputs are submitted.
    RequiresAction {
        run_id: String,
        tool_calls: Vec<super::ToolCall>,
    },
}

impl AssistantStreamEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RunCreated { .. } => "run_created",
            Self::MessageDelta { .. } => "message_delta",
            Self::RunCompleted { .. } => "run_completed",
            Self::RunStepCreated { .. } => "run_step_created",
            Self::RequiresAction { .. } => "requires_action",
        }
    }

    /// Convenience constructor for a single text delta.
    pub fn text_delta(text: impl Into<String>) -> Self {
        Self::MessageDelta {
            content: vec![ContentDelta::Text(text.into())],
        }
    }
}

/// A delta part of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDelta {
    Text(String),
    /// Non-text part (image file, refusal, ...), identified by its type tag.
    Other(String),
}

/// A finished part of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Other(String),
}

/// What a run step does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    MessageCreation,
    ToolCalls,
    Other(String),
}

impl From<&str> for StepKind {
    fn from(value: &str) -> Self {
        match value {
            "message_creation" => Self::MessageCreation,
            "tool_calls" => Self::ToolCalls,
            other => Self::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_kind_from_wire_tag() {
        assert_eq!(StepKind::from("message_creation"), StepKind::MessageCreation);
        assert_eq!(StepKind::from("tool_calls"), StepKind::ToolCalls);
        assert_eq!(StepKind::from("other"), StepKind::Other("other".to_string()));
    }

    #[test]
    fn text_delta_wraps_single_part() {
        let event = AssistantStreamEvent::text_delta("Hel");
        assert_eq!(
            event,
            AssistantStreamEvent::MessageDelta {
                content: vec![ContentDelta::Text("Hel".to_string())]
            }
        );
        assert_eq!(event.kind(), "message_delta");
    }
}
