//! Stream Chat server client - Implementation of `ChatPlatform` over REST.
//!
//! Authenticates as the server with an HS256 token signed by the application
//! secret (`{"server": true}`), sent with `stream-auth-type: jwt`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StreamChatConfig::new(api_key, api_secret)?;
//! let client = StreamChatClient::new(config, hub)?;
//! ```
//!
//! Inbound events are not pulled from the platform; webhook deliveries are
//! published into the shared [`ChatEventHub`] and subscriptions come from it.

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::domain::chat::{ChannelEvent, ChannelRef, ChatMessage, NewMessage};
use crate::ports::{ChatError, ChatEventHub, ChatPlatform, Subscription};

const DEFAULT_BASE_URL: &str = "https://chat.stream-io-api.com";

/// Configuration for the Stream Chat client.
#[derive(Debug, Clone)]
pub struct StreamChatConfig {
    api_key: String,
    api_secret: SecretString,
    /// REST base URL (default: https://chat.stream-io-api.com).
    pub base_url: String,
}

impl StreamChatConfig {
    /// Creates a configuration; both values must be non-empty.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self, ChatError> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(ChatError::MissingCredentials);
        }
        Ok(Self {
            api_key,
            api_secret: Secret::new(api_secret),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Builds from application configuration.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        match (&config.api_key, &config.api_secret) {
            (Some(key), Some(secret)) => {
                Ok(Self::new(key.clone(), secret.clone())?.with_base_url(config.base_url.clone()))
            }
            _ => Err(ChatError::MissingCredentials),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The application secret, shared with webhook verification.
    pub fn api_secret(&self) -> &SecretString {
        &self.api_secret
    }
}

#[derive(Debug, Serialize)]
struct ServerClaims {
    server: bool,
}

/// Signs the server-side token used on every request.
pub fn server_token(secret: &SecretString) -> Result<String, ChatError> {
    encode(
        &Header::default(),
        &ServerClaims { server: true },
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| ChatError::Token(e.to_string()))
}

/// Stream Chat REST client.
pub struct StreamChatClient {
    config: StreamChatConfig,
    client: Client,
    token: Secret<String>,
    hub: Arc<ChatEventHub>,
}

impl StreamChatClient {
    /// Creates a client and signs its server token.
    pub fn new(config: StreamChatConfig, hub: Arc<ChatEventHub>) -> Result<Self, ChatError> {
        let token = server_token(&config.api_secret)?;
        Ok(Self {
            config,
            client: Client::new(),
            token: Secret::new(token),
            hub,
        })
    }

    /// Hub that webhook deliveries are published into.
    pub fn event_hub(&self) -> Arc<ChatEventHub> {
        Arc::clone(&self.hub)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .query(&[("api_key", self.config.api_key.as_str())])
            .header("Authorization", self.token.expose_secret())
            .header("stream-auth-type", "jwt")
            .header("Content-Type", "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ChatError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ChatError::network(e.to_string()))?;
        Self::handle_response_status(response).await
    }

    /// Maps non-success statuses to `ChatError::Api`.
    async fn handle_response_status(response: Response) -> Result<Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Chat API request failed");
        Err(ChatError::api(status.as_u16(), body))
    }
}

#[derive(Serialize)]
struct PartialUpdateRequest<'a> {
    set: TextPatch<'a>,
}

#[derive(Serialize)]
struct TextPatch<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SendEventRequest {
    event: ChannelEvent,
}

#[derive(Serialize)]
struct SendMessageRequest {
    message: NewMessage,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    id: String,
    #[serde(default)]
    cid: Option<String>,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ChatPlatform for StreamChatClient {
    async fn partial_update_text(&self, message_id: &str, text: &str) -> Result<(), ChatError> {
        tracing::debug!(message_id, text_len = text.len(), "Partial message update");
        let body = PartialUpdateRequest {
            set: TextPatch { text },
        };
        self.send(
            self.client
                .put(self.url(&format!("/messages/{}", message_id)))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn send_channel_event(
        &self,
        channel: &ChannelRef,
        event: ChannelEvent,
    ) -> Result<(), ChatError> {
        tracing::debug!(cid = %channel, event_type = event.event_type(), "Sending channel event");
        let path = format!("/channels/{}/{}/event", channel.channel_type, channel.channel_id);
        self.send(self.client.post(self.url(&path)).json(&SendEventRequest { event }))
            .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        channel: &ChannelRef,
        message: NewMessage,
    ) -> Result<ChatMessage, ChatError> {
        let path = format!("/channels/{}/{}/message", channel.channel_type, channel.channel_id);
        let response = self
            .send(
                self.client
                    .post(self.url(&path))
                    .json(&SendMessageRequest { message }),
            )
            .await?;
        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|e| ChatError::parse(format!("Failed to parse message response: {}", e)))?;

        let cid = parsed.message.cid.unwrap_or_else(|| channel.cid());
        Ok(ChatMessage::new(parsed.message.id, cid, parsed.message.text))
    }

    fn subscribe(&self, event_type: &str) -> Subscription {
        self.hub.subscribe(event_type)
    }
}
