//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Nested values use the `RELAY` prefix with
//! `__` separators; the conventional variable names used by the hosting
//! platforms (`PORT`, `STREAM_API_KEY`, ...) are overlaid on top.
//!
//! # Example
//!
//! ```no_run
//! use stream_chat_backend::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on port {}", config.server.port);
//! ```

mod ai;
mod chat;
mod error;
mod search;
mod server;

pub use ai::AiConfig;
pub use chat::ChatConfig;
pub use error::{ConfigError, ValidationError};
pub use search::SearchConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;
use std::env;

/// Conventional variable names and the config keys they populate.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("STREAM_API_KEY", "chat.api_key"),
    ("STREAM_API_SECRET", "chat.api_secret"),
    ("OPENAI_API_KEY", "ai.openai_api_key"),
    ("OPENAI_ASSISTANT_ID", "ai.assistant_id"),
    ("TAVILY_API_KEY", "search.tavily_api_key"),
];

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat platform credentials
    #[serde(default)]
    pub chat: ChatConfig,

    /// Assistant provider configuration (OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// Web search configuration (Tavily)
    #[serde(default)]
    pub search: SearchConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `RELAY` prefix and `__` separators
    /// 3. Overlays `PORT`, `STREAM_API_KEY`, `STREAM_API_SECRET`,
    ///    `OPENAI_API_KEY`, `OPENAI_ASSISTANT_ID` and `TAVILY_API_KEY`
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `RELAY__SERVER__HOST=127.0.0.1` -> `server.host = 127.0.0.1`
    /// - `PORT=8080` -> `server.port = 8080`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder().add_source(
            config::Environment::default()
                .prefix("RELAY")
                .separator("__"),
        );

        for (variable, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, env::var(variable).ok())?;
        }

        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Missing chat credentials are fatal: the process cannot serve without
    /// them. The search key is only checked when a search is attempted.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.chat.validate()?;
        self.ai.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
