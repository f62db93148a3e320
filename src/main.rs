//! Stream Chat Backend server entry point.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use stream_chat_backend::adapters::ai::{OpenAIAssistantsConfig, OpenAIAssistantsProvider};
use stream_chat_backend::adapters::chat::{StreamChatClient, StreamChatConfig, WebhookVerifier};
use stream_chat_backend::adapters::http::{build_router, RelayAppState};
use stream_chat_backend::adapters::search::{TavilyConfig, TavilySearch};
use stream_chat_backend::application::{AgentFactory, AgentRegistry};
use stream_chat_backend::config::{AppConfig, ConfigError};
use stream_chat_backend::ports::ChatEventHub;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    config.validate().map_err(ConfigError::from)?;

    let event_hub = Arc::new(ChatEventHub::new());
    let chat_config = StreamChatConfig::from_config(&config.chat)?;
    let webhook_verifier = config
        .server
        .verify_webhooks
        .then(|| Arc::new(WebhookVerifier::new(chat_config.api_secret().clone())));
    let chat = Arc::new(StreamChatClient::new(chat_config, Arc::clone(&event_hub))?);

    let search = TavilyConfig::from_config(&config.search);
    if !search.has_api_key() {
        tracing::warn!("TAVILY_API_KEY not set; web search tool calls will fail");
    }

    let mut factory =
        AgentFactory::new(chat).with_web_search(Arc::new(TavilySearch::new(search)));
    match (&config.ai.openai_api_key, &config.ai.assistant_id) {
        (Some(api_key), Some(assistant_id)) if !api_key.is_empty() => {
            let provider = OpenAIAssistantsProvider::new(
                OpenAIAssistantsConfig::new(api_key.clone())
                    .with_base_url(config.ai.base_url.clone()),
            );
            factory = factory.with_openai(Arc::new(provider), assistant_id.clone());
        }
        _ => tracing::warn!("OPENAI_API_KEY not set; agents cannot be started"),
    }
    let agents = Arc::new(AgentRegistry::new(factory));

    let state = RelayAppState {
        event_hub,
        webhook_verifier,
        agents: Arc::clone(&agents),
    };
    let app = build_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Server is running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    agents.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
