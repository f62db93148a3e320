//! AI provider configuration

use serde::Deserialize;

use super::error::ValidationError;

/// OpenAI Assistants configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Assistant that answers channel messages
    pub assistant_id: Option<String>,

    /// API base URL, overridable for proxies and tests
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl AiConfig {
    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate AI configuration
    ///
    /// The provider is optional at startup; agents fail to start without it.
    /// A key without an assistant is a misconfiguration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.has_openai() && self.assistant_id.as_ref().map_or(true, |id| id.is_empty()) {
            return Err(ValidationError::MissingRequired("OPENAI_ASSISTANT_ID"));
        }
        if !self.base_url.starts_with("http") {
            return Err(ValidationError::InvalidBaseUrl("ai"));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            assistant_id: None,
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
