//! OpenAI Assistants Provider - Implementation of `AssistantProvider`.
//!
//! Threads, messages and runs over the Assistants v2 REST API. Runs are
//! started with `stream: true` and the Server-Sent Events body is decoded into
//! [`AssistantStreamEvent`]s.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIAssistantsConfig::new(api_key)
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIAssistantsProvider::new(config);
//! ```
//!
//! # Streaming
//!
//! Only the events the relay consumes are surfaced. `thread.run.failed`,
//! `thread.run.expired` and `error` frames become stream errors; `done` and
//! every other event type are skipped.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::sse::{SseDecoder, SseFrame};
use crate::domain::assistant::{
    AssistantStreamEvent, ContentDelta, MessageContent, StepKind, ToolCall, ToolOutput,
};
use crate::ports::{AIError, AssistantEventStream, AssistantProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI Assistants provider.
#[derive(Debug, Clone)]
pub struct OpenAIAssistantsConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
}

impl OpenAIAssistantsConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI Assistants API provider implementation.
pub struct OpenAIAssistantsProvider {
    config: OpenAIAssistantsConfig,
    client: Client,
}

impl OpenAIAssistantsProvider {
    /// Creates a new provider with the given configuration.
    pub fn new(config: OpenAIAssistantsConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// Sends a request and maps transport and status failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response, AIError> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                AIError::network(format!("Connection failed: {}", e))
            } else {
                AIError::network(e.to_string())
            }
        })?;
        Self::handle_response_status(response).await
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(AIError::AuthenticationFailed),
            404 => Err(AIError::NotFound(error_body)),
            429 => Err(AIError::rate_limited(parse_retry_after(&error_body))),
            400 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn open_stream(&self, request: RequestBuilder) -> Result<AssistantEventStream, AIError> {
        let response = self.send(request).await?;
        Ok(decode_event_stream(response))
    }
}

/// Turns an SSE response body into provider events.
fn decode_event_stream(response: Response) -> AssistantEventStream {
    decode_sse(response.bytes_stream())
}

/// Decodes a chunked SSE body. A trailing frame without a blank line is
/// flushed when the body ends.
fn decode_sse<S, B, E>(body: S) -> AssistantEventStream
where
    S: futures::Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let stream = body
        .map(Some)
        .chain(stream::once(futures::future::ready(None)))
        .scan(SseDecoder::new(), |decoder, chunk| {
            let frames = match chunk {
                Some(Ok(bytes)) => decoder.push(bytes.as_ref()),
                Some(Err(e)) => {
                    let error = AIError::network(format!("Stream error: {}", e));
                    return futures::future::ready(Some(vec![Err(error)]));
                }
                None => decoder.finish().into_iter().collect(),
            };
            let items: Vec<Result<AssistantStreamEvent, AIError>> = frames
                .iter()
                .filter_map(|frame| parse_frame(frame).transpose())
                .collect();
            futures::future::ready(Some(items))
        })
        .flat_map(stream::iter);

    Box::pin(stream)
}

/// Parses retry-after from error response ("try again in Xs"), defaulting to 30.
fn parse_retry_after(error_body: &str) -> u32 {
    serde_json::from_str::<WireErrorEnvelope>(error_body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| {
            let message = error.message?;
            let rest = &message[message.find("try again in ")? + 13..];
            let end = rest.find(|c: char| !c.is_ascii_digit())?;
            rest[..end].parse().ok()
        })
        .unwrap_or(30)
}

/// Translates one SSE frame. `Ok(None)` means the frame is not relevant.
pub(crate) fn parse_frame(frame: &SseFrame) -> Result<Option<AssistantStreamEvent>, AIError> {
    let Some(event) = frame.event.as_deref() else {
        return Ok(None);
    };

    let event = match event {
        "thread.run.created" => {
            let run: WireRun = decode(frame)?;
            AssistantStreamEvent::RunCreated { run_id: run.id }
        }
        "thread.message.delta" => {
            let delta: WireMessageDelta = decode(frame)?;
            AssistantStreamEvent::MessageDelta {
                content: delta
                    .delta
                    .content
                    .into_iter()
                    .map(WireContentPart::into_delta)
                    .collect(),
            }
        }
        "thread.run.completed" => {
            let run: WireRun = decode(frame)?;
            AssistantStreamEvent::RunCompleted {
                run_id: run.id,
                content: run
                    .content
                    .into_iter()
                    .map(WireContentPart::into_content)
                    .collect(),
            }
        }
        "thread.run.step.created" => {
            let step: WireRunStep = decode(frame)?;
            AssistantStreamEvent::RunStepCreated {
                run_id: step.run_id,
                step: StepKind::from(step.step_details.kind.as_str()),
            }
        }
        "thread.run.requires_action" => {
            let run: WireRun = decode(frame)?;
            let tool_calls = run
                .required_action
                .map(|action| action.submit_tool_outputs.tool_calls)
                .unwrap_or_default()
                .into_iter()
                .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
                .collect();
            AssistantStreamEvent::RequiresAction {
                run_id: run.id,
                tool_calls,
            }
        }
        "thread.run.failed" => {
            let run: WireRun = decode(frame)?;
            let message = run
                .last_error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Run failed".to_string());
            return Err(AIError::run_failed(message));
        }
        "thread.run.expired" => return Err(AIError::run_failed("Run expired")),
        "error" => {
            let message = serde_json::from_str::<WireErrorEnvelope>(&frame.data)
                .ok()
                .and_then(|envelope| envelope.error.and_then(|e| e.message).or(envelope.message))
                .unwrap_or_else(|| frame.data.clone());
            return Err(AIError::unavailable(message));
        }
        _ => return Ok(None),
    };

    Ok(Some(event))
}

fn decode<T: for<'de> Deserialize<'de>>(frame: &SseFrame) -> Result<T, AIError> {
    serde_json::from_str(&frame.data).map_err(|e| {
        AIError::parse(format!(
            "Failed to parse {} event: {}",
            frame.event.as_deref().unwrap_or("unnamed"),
            e
        ))
    })
}

#[async_trait]
impl AssistantProvider for OpenAIAssistantsProvider {
    async fn create_thread(&self) -> Result<String, AIError> {
        let response = self
            .send(self.post("/threads").json(&serde_json::json!({})))
            .await?;
        let thread: WireObject = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse thread: {}", e)))?;
        tracing::debug!(thread_id = %thread.id, "Created assistant thread");
        Ok(thread.id)
    }

    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<(), AIError> {
        let body = CreateMessageRequest {
            role: "user",
            content: text,
        };
        self.send(
            self.post(&format!("/threads/{}/messages", thread_id))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn stream_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<AssistantEventStream, AIError> {
        tracing::debug!(thread_id, assistant_id, "Starting streaming run");
        let body = CreateRunRequest {
            assistant_id,
            stream: true,
        };
        self.open_stream(self.post(&format!("/threads/{}/runs", thread_id)).json(&body))
            .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<AssistantEventStream, AIError> {
        tracing::debug!(thread_id, run_id, outputs = outputs.len(), "Submitting tool outputs");
        let body = SubmitToolOutputsRequest {
            tool_outputs: outputs,
            stream: true,
        };
        self.open_stream(
            self.post(&format!(
                "/threads/{}/runs/{}/submit_tool_outputs",
                thread_id, run_id
            ))
            .json(&body),
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), AIError> {
        self.send(self.post(&format!("/threads/{}/runs/{}/cancel", thread_id, run_id)))
            .await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct SubmitToolOutputsRequest {
    tool_outputs: Vec<ToolOutput>,
    stream: bool,
}

#[derive(Deserialize)]
struct WireObject {
    id: String,
}

#[derive(Deserialize)]
struct WireRun {
    id: String,
    #[serde(default)]
    content: Vec<WireContentPart>,
    #[serde(default)]
    required_action: Option<WireRequiredAction>,
    #[serde(default)]
    last_error: Option<WireError>,
}

#[derive(Deserialize)]
struct WireRequiredAction {
    submit_tool_outputs: WireSubmitToolOutputs,
}

#[derive(Deserialize)]
struct WireSubmitToolOutputs {
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct WireMessageDelta {
    delta: WireDelta,
}

#[derive(Deserialize)]
struct WireDelta {
    #[serde(default)]
    content: Vec<WireContentPart>,
}

#[derive(Deserialize)]
struct WireContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<WireText>,
}

impl WireContentPart {
    fn text_value(&mut self) -> Option<String> {
        if self.kind != "text" {
            return None;
        }
        Some(self.text.take().and_then(|t| t.value).unwrap_or_default())
    }

    fn into_delta(mut self) -> ContentDelta {
        match self.text_value() {
            Some(text) => ContentDelta::Text(text),
            None => ContentDelta::Other(self.kind),
        }
    }

    fn into_content(mut self) -> MessageContent {
        match self.text_value() {
            Some(text) => MessageContent::Text(text),
            None => MessageContent::Other(self.kind),
        }
    }
}

#[derive(Deserialize)]
struct WireText {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct WireRunStep {
    run_id: String,
    step_details: WireStepDetails,
}

#[derive(Deserialize)]
struct WireStepDetails {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct WireErrorEnvelope {
    #[serde(default)]
    error: Option<WireError>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: Some(event.to_string()),
            data: data.to_string(),
        }
    }

    fn chunks(parts: &[&str]) -> impl futures::Stream<Item = Result<Vec<u8>, std::io::Error>> {
        let parts: Vec<_> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(parts)
    }

    #[tokio::test]
    async fn trailing_frame_without_blank_line_is_decoded() {
        let body = chunks(&[
            "event: thread.run.created\ndata: {\"id\":\"run_1\"}\n\n",
            "event: thread.run.completed\ndata: {\"id\":\"run_1\"}",
        ]);

        let events: Vec<_> = decode_sse(body).collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            Ok(AssistantStreamEvent::RunCreated {
                run_id: "run_1".to_string()
            })
        );
        assert!(matches!(
            &events[1],
            Ok(AssistantStreamEvent::RunCompleted { run_id, .. }) if run_id == "run_1"
        ));
    }

    #[tokio::test]
    async fn frames_split_across_chunks_are_joined() {
        let body = chunks(&["event: thread.run.cre", "ated\ndata: {\"id\":", "\"run_7\"}\n\n"]);

        let events: Vec<_> = decode_sse(body).collect().await;

        assert_eq!(
            events,
            vec![Ok(AssistantStreamEvent::RunCreated {
                run_id: "run_7".to_string()
            })]
        );
    }

    #[test]
    fn parses_run_created() {
        let event = parse_frame(&frame("thread.run.created", r#"{"id":"run_1","object":"thread.run"}"#))
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            AssistantStreamEvent::RunCreated {
                run_id: "run_1".to_string()
            }
        );
    }

    #[test]
    fn parses_text_and_non_text_deltas() {
        let data = r#"{"id":"msg_1","delta":{"content":[
            {"index":0,"type":"text","text":{"value":"Hel","annotations":[]}},
            {"index":1,"type":"image_file","image_file":{"file_id":"f"}}
        ]}}"#;
        let event = parse_frame(&frame("thread.message.delta", data)).unwrap().unwrap();
        assert_eq!(
            event,
            AssistantStreamEvent::MessageDelta {
                content: vec![
                    ContentDelta::Text("Hel".to_string()),
                    ContentDelta::Other("image_file".to_string()),
                ]
            }
        );
    }

    #[test]
    fn parses_run_completed_without_content() {
        let event = parse_frame(&frame("thread.run.completed", r#"{"id":"run_1","status":"completed"}"#))
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            AssistantStreamEvent::RunCompleted {
                run_id: "run_1".to_string(),
                content: vec![]
            }
        );
    }

    #[test]
    fn parses_step_kind() {
        let data = r#"{"id":"step_1","run_id":"run_1","step_details":{"type":"message_creation"}}"#;
        let event = parse_frame(&frame("thread.run.step.created", data)).unwrap().unwrap();
        assert_eq!(
            event,
            AssistantStreamEvent::RunStepCreated {
                run_id: "run_1".to_string(),
                step: StepKind::MessageCreation
            }
        );
    }

    #[test]
    fn parses_requires_action_tool_calls() {
        let data = r#"{"id":"run_1","required_action":{"type":"submit_tool_outputs",
            "submit_tool_outputs":{"tool_calls":[{"id":"call_1","type":"function",
            "function":{"name":"web_search","arguments":"{\"query\":\"rust\"}"}}]}}}"#;
        let event = parse_frame(&frame("thread.run.requires_action", data)).unwrap().unwrap();
        assert_eq!(
            event,
            AssistantStreamEvent::RequiresAction {
                run_id: "run_1".to_string(),
                tool_calls: vec![ToolCall::new("call_1", "web_search", r#"{"query":"rust"}"#)]
            }
        );
    }

    #[test]
    fn failed_run_is_an_error() {
        let data = r#"{"id":"run_1","last_error":{"code":"server_error","message":"boom"}}"#;
        assert_eq!(
            parse_frame(&frame("thread.run.failed", data)),
            Err(AIError::run_failed("boom"))
        );
    }

    #[test]
    fn error_event_is_an_error() {
        let data = r#"{"error":{"message":"overloaded"}}"#;
        assert_eq!(
            parse_frame(&frame("error", data)),
            Err(AIError::unavailable("overloaded"))
        );
    }

    #[test]
    fn irrelevant_frames_are_skipped() {
        assert_eq!(parse_frame(&frame("done", "[DONE]")), Ok(None));
        assert_eq!(parse_frame(&frame("thread.message.created", "{}")), Ok(None));
        assert_eq!(
            parse_frame(&SseFrame {
                event: None,
                data: "x".to_string()
            }),
            Ok(None)
        );
    }

    #[test]
    fn malformed_payload_is_parse_error() {
        assert!(matches!(
            parse_frame(&frame("thread.run.created", "not json")),
            Err(AIError::Parse(_))
        ));
    }

    #[test]
    fn retry_after_is_extracted() {
        let body = r#"{"error":{"message":"Rate limit reached. Please try again in 20s."}}"#;
        assert_eq!(parse_retry_after(body), 20);
        assert_eq!(parse_retry_after("garbage"), 30);
    }

    const RUN_BODY: &str = "event: thread.run.created\n\
data: {\"id\":\"run_1\"}\n\n\
event: thread.message.delta\n\
data: {\"delta\":{\"content\":[{\"type\":\"text\",\"text\":{\"value\":\"Hi\"}}]}}\n\n\
event: thread.run.completed\n\
data: {\"id\":\"run_1\"}\n\n\
event: done\n\
data: [DONE]\n\n";

    async fn spawn_stub() -> String {
        let app = Router::new()
            .route(
                "/threads",
                post(|headers: HeaderMap| async move {
                    if headers.get("OpenAI-Beta").and_then(|v| v.to_str().ok())
                        != Some("assistants=v2")
                    {
                        return (StatusCode::BAD_REQUEST, "missing beta header").into_response();
                    }
                    axum::Json(serde_json::json!({"id": "thread_1"})).into_response()
                }),
            )
            .route(
                "/threads/:thread/runs",
                post(|Path(thread): Path<String>| async move {
                    if thread != "thread_1" {
                        return (StatusCode::NOT_FOUND, "no such thread").into_response();
                    }
                    ([(header::CONTENT_TYPE, "text/event-stream")], RUN_BODY).into_response()
                }),
            )
            .route(
                "/threads/:thread/runs/:run/cancel",
                post(|| async { StatusCode::UNAUTHORIZED }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(base_url: &str) -> OpenAIAssistantsProvider {
        OpenAIAssistantsProvider::new(OpenAIAssistantsConfig::new("sk-test").with_base_url(base_url))
    }

    #[tokio::test]
    async fn create_thread_returns_id() {
        let base_url = spawn_stub().await;
        assert_eq!(provider(&base_url).create_thread().await.unwrap(), "thread_1");
    }

    #[tokio::test]
    async fn stream_run_decodes_events() {
        let base_url = spawn_stub().await;
        let stream = provider(&base_url)
            .stream_run("thread_1", "asst_1")
            .await
            .unwrap();
        let events: Vec<_> = stream.collect().await;

        assert_eq!(
            events,
            vec![
                Ok(AssistantStreamEvent::RunCreated {
                    run_id: "run_1".to_string()
                }),
                Ok(AssistantStreamEvent::text_delta("Hi")),
                Ok(AssistantStreamEvent::RunCompleted {
                    run_id: "run_1".to_string(),
                    content: vec![]
                }),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_thread_is_not_found() {
        let base_url = spawn_stub().await;
        let result = provider(&base_url).stream_run("thread_x", "asst_1").await;
        assert!(matches!(result, Err(AIError::NotFound(_))));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let base_url = spawn_stub().await;
        let result = provider(&base_url).cancel_run("thread_1", "run_1").await;
        assert_eq!(result, Err(AIError::AuthenticationFailed));
    }
}
