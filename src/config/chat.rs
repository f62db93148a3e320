//! Chat platform configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Stream Chat server credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Application API key
    pub api_key: Option<String>,

    /// Application API secret, used for server tokens and webhook signatures
    pub api_secret: Option<String>,

    /// REST base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl ChatConfig {
    /// Validate chat configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.as_ref().map_or(true, |k| k.is_empty()) {
            return Err(ValidationError::MissingRequired("STREAM_API_KEY"));
        }
        if self.api_secret.as_ref().map_or(true, |s| s.is_empty()) {
            return Err(ValidationError::MissingRequired("STREAM_API_SECRET"));
        }
        if !self.base_url.starts_with("http") {
            return Err(ValidationError::InvalidBaseUrl("chat"));
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://chat.stream-io-api.com".to_string()
}
