//! Message metadata used by the writing-assistant platform.

use serde::{Deserialize, Serialize};

/// Custom data attached to writing-assistant messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<WritingCustom>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingCustom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Vec<String>>,
    #[serde(rename = "writingTask", default, skip_serializing_if = "Option::is_none")]
    pub writing_task: Option<String>,
    #[serde(rename = "messageType", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<WritingMessageType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingMessageType {
    UserInput,
    AiResponse,
    SystemMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_custom_fields() {
        let json = r#"{"custom":{"suggestion":["a","b"],"writingTask":"essay","messageType":"ai_response"}}"#;
        let message: WritingMessage = serde_json::from_str(json).unwrap();
        let custom = message.custom.unwrap();

        assert_eq!(custom.suggestion, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(custom.writing_task.as_deref(), Some("essay"));
        assert_eq!(custom.message_type, Some(WritingMessageType::AiResponse));
    }

    #[test]
    fn empty_message_has_no_custom() {
        let message: WritingMessage = serde_json::from_str("{}").unwrap();
        assert_eq!(message, WritingMessage::default());
        assert_eq!(serde_json::to_string(&message).unwrap(), "{}");
    }
}
