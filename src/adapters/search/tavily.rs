//! Tavily search adapter - Implementation of `WebSearch`.
//!
//! Every search is sent with the same fixed parameters. Failures after the
//! credential check are reported inside the returned JSON rather than as
//! errors, so the assistant can read them as tool output.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret, SecretString};
use serde::Serialize;

use crate::config::SearchConfig;
use crate::ports::{search_error_envelope, SearchError, SearchParameters, WebSearch};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Configuration for the Tavily adapter.
#[derive(Debug, Clone)]
pub struct TavilyConfig {
    api_key: Option<SecretString>,
    pub base_url: String,
    pub parameters: SearchParameters,
}

impl TavilyConfig {
    /// An empty key counts as absent.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()).map(Secret::new),
            base_url: DEFAULT_BASE_URL.to_string(),
            parameters: SearchParameters::default(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.tavily_api_key.clone()).with_base_url(config.base_url.clone())
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(flatten)]
    parameters: &'a SearchParameters,
}

/// Tavily search client.
pub struct TavilySearch {
    config: TavilyConfig,
    client: Client,
}

impl TavilySearch {
    pub fn new(config: TavilyConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn failure(query: &str, details: String) -> String {
        tracing::warn!(query, details = %details, "Tavily search failed");
        search_error_envelope(format!("Tavily Search failed: {}", details), details)
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        let api_key = self.config.api_key.as_ref().ok_or(SearchError::MissingApiKey)?;

        tracing::info!(query, "Performing web search");

        let request = SearchRequest {
            query,
            parameters: &self.config.parameters,
        };
        let response = match self
            .client
            .post(format!("{}/search", self.config.base_url))
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(Self::failure(query, e.to_string())),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Ok(Self::failure(query, e.to_string())),
        };

        if !status.is_success() {
            return Ok(Self::failure(query, body));
        }

        tracing::debug!(query, bytes = body.len(), "Web search succeeded");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Stub {
        hits: Arc<AtomicUsize>,
        last_body: Arc<Mutex<Option<serde_json::Value>>>,
        last_auth: Arc<Mutex<Option<String>>>,
    }

    async fn spawn_stub(status: StatusCode, reply: &'static str) -> (String, Stub) {
        let stub = Stub::default();
        let app = Router::new()
            .route(
                "/search",
                post(
                    move |State(stub): State<Stub>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        stub.hits.fetch_add(1, Ordering::SeqCst);
                        *stub.last_body.lock().unwrap() = Some(body);
                        *stub.last_auth.lock().unwrap() = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        (status, reply)
                    },
                ),
            )
            .with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), stub)
    }

    fn search(key: Option<&str>, base_url: &str) -> TavilySearch {
        TavilySearch::new(TavilyConfig::new(key.map(str::to_string)).with_base_url(base_url))
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let (base_url, stub) = spawn_stub(StatusCode::OK, "{}").await;

        assert_eq!(
            search(None, &base_url).search("rust").await,
            Err(SearchError::MissingApiKey)
        );
        assert_eq!(
            search(Some(""), &base_url).search("rust").await,
            Err(SearchError::MissingApiKey)
        );
        assert_eq!(stub.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_returns_payload_verbatim() {
        let reply = r#"{"answer":"42","results":[{"title":"t","url":"u"}]}"#;
        let (base_url, stub) = spawn_stub(StatusCode::OK, reply).await;

        let result = search(Some("tvly-key"), &base_url).search("meaning").await.unwrap();

        assert_eq!(result, reply);
        assert_eq!(stub.last_auth.lock().unwrap().as_deref(), Some("Bearer tvly-key"));
        assert_eq!(
            stub.last_body.lock().unwrap().clone().unwrap(),
            serde_json::json!({
                "query": "meaning",
                "search_depth": "advanced",
                "max_results": 5,
                "include_answers": true,
                "include_raw_content": false
            })
        );
    }

    #[tokio::test]
    async fn non_success_status_yields_error_envelope() {
        let (base_url, _stub) = spawn_stub(StatusCode::UNAUTHORIZED, "invalid key").await;

        let result = search(Some("bad"), &base_url).search("rust").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(value["error"], "Tavily Search failed: invalid key");
        assert_eq!(value["details"], "invalid key");
    }

    #[tokio::test]
    async fn transport_failure_yields_error_envelope() {
        let result = search(Some("key"), "http://127.0.0.1:1").search("rust").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Tavily Search failed: "));
        assert!(value["details"].is_string());
    }
}
