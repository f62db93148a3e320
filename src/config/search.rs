//! Web search configuration

use serde::Deserialize;

/// Tavily search configuration
///
/// The key is optional: searches without it fail at call time.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub tavily_api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl SearchConfig {
    pub fn has_api_key(&self) -> bool {
        self.tavily_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.tavily.com".to_string()
}
