//! OpenAI-backed chat agent.
//!
//! Owns one assistant thread per channel. Every user message becomes a run
//! whose output is relayed into a fresh AI placeholder message by a
//! [`ResponseRelay`] on its own task.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::application::handlers::{RelayError, ResponseRelay};
use crate::domain::agent::{AgentBinding, AgentPlatform, AgentState};
use crate::domain::chat::NewMessage;
use crate::ports::{AgentError, AssistantProvider, ChatAgent, ChatPlatform, WebSearch};

type RelaySet = Arc<Mutex<HashSet<String>>>;

fn lock_relays(relays: &RelaySet) -> MutexGuard<'_, HashSet<String>> {
    relays.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Chat agent answering through OpenAI Assistants.
pub struct OpenAIAgent {
    binding: AgentBinding,
    assistant_id: String,
    chat: Arc<dyn ChatPlatform>,
    provider: Arc<dyn AssistantProvider>,
    web_search: Option<Arc<dyn WebSearch>>,
    thread_id: OnceLock<String>,
    last_interaction: RwLock<Option<DateTime<Utc>>>,
    active_relays: RelaySet,
    shutdown: CancellationToken,
    disposed: AtomicBool,
}

impl OpenAIAgent {
    pub fn new(
        binding: AgentBinding,
        assistant_id: impl Into<String>,
        chat: Arc<dyn ChatPlatform>,
        provider: Arc<dyn AssistantProvider>,
    ) -> Self {
        Self {
            binding,
            assistant_id: assistant_id.into(),
            chat,
            provider,
            web_search: None,
            thread_id: OnceLock::new(),
            last_interaction: RwLock::new(None),
            active_relays: Arc::new(Mutex::new(HashSet::new())),
            shutdown: CancellationToken::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Enables web search for tool calls.
    pub fn with_web_search(mut self, web_search: Arc<dyn WebSearch>) -> Self {
        self.web_search = Some(web_search);
        self
    }

    /// Assistant thread, once initialized.
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.get().map(String::as_str)
    }

    /// Number of relays still running.
    pub fn active_relays(&self) -> usize {
        lock_relays(&self.active_relays).len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatAgent for OpenAIAgent {
    fn platform(&self) -> AgentPlatform {
        AgentPlatform::OpenAi
    }

    fn binding(&self) -> &AgentBinding {
        &self.binding
    }

    fn state(&self) -> AgentState {
        AgentState::OpenAi {
            assistant_id: self.assistant_id.clone(),
            thread_id: self.thread_id.get().cloned(),
        }
    }

    async fn last_interaction(&self) -> Option<DateTime<Utc>> {
        *self.last_interaction.read().await
    }

    async fn init(&self) -> Result<(), AgentError> {
        if self.is_disposed() {
            return Err(AgentError::Disposed);
        }
        if self.thread_id.get().is_some() {
            return Ok(());
        }
        let thread_id = self.provider.create_thread().await?;
        tracing::info!(cid = %self.binding.channel, thread_id = %thread_id, "Agent initialized");
        // A concurrent init may have won; keep the first thread.
        let _ = self.thread_id.set(thread_id);
        Ok(())
    }

    async fn handle_message(&self, text: &str) -> Result<(), AgentError> {
        if self.is_disposed() {
            return Err(AgentError::Disposed);
        }
        let thread_id = self.thread_id.get().ok_or(AgentError::NotInitialized)?;
        if text.trim().is_empty() {
            tracing::debug!(cid = %self.binding.channel, "Ignoring empty message");
            return Ok(());
        }

        *self.last_interaction.write().await = Some(Utc::now());

        self.provider.add_user_message(thread_id, text).await?;
        let message = self
            .chat
            .send_message(
                &self.binding.channel,
                NewMessage::ai_placeholder(self.binding.user_id.clone()),
            )
            .await?;

        let message_id = message.id.clone();
        lock_relays(&self.active_relays).insert(message_id.clone());
        let relays = Arc::clone(&self.active_relays);
        let on_dispose = Box::new(move || {
            lock_relays(&relays).remove(&message_id);
        });

        let mut relay = ResponseRelay::new(
            Arc::clone(&self.chat),
            Arc::clone(&self.provider),
            thread_id.clone(),
            self.binding.channel.clone(),
            message,
            on_dispose,
        )
        .with_shutdown(self.shutdown.child_token());
        if let Some(web_search) = &self.web_search {
            relay = relay.with_web_search(Arc::clone(web_search));
        }

        let stream = match self.provider.stream_run(thread_id, &self.assistant_id).await {
            Ok(stream) => stream,
            Err(error) => {
                relay.handle_error(&RelayError::from(error.clone())).await;
                return Err(error.into());
            }
        };

        tracing::info!(
            cid = %self.binding.channel,
            message_id = %relay.message().id,
            "Relaying assistant run"
        );
        tokio::spawn(relay.run(stream));
        Ok(())
    }

    async fn dispose(&self) -> Result<(), AgentError> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.shutdown.cancel();
        tracing::info!(
            cid = %self.binding.channel,
            active_relays = self.active_relays(),
            "Agent disposed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAssistantProvider, MockRun};
    use crate::adapters::chat::InMemoryChatPlatform;
    use crate::domain::assistant::AssistantStreamEvent;
    use crate::domain::chat::ChannelRef;
    use crate::ports::AIError;
    use std::time::Duration;

    fn agent(chat: Arc<InMemoryChatPlatform>, provider: MockAssistantProvider) -> OpenAIAgent {
        OpenAIAgent::new(
            AgentBinding::for_channel(ChannelRef::new("messaging", "general")),
            "asst_1",
            chat,
            Arc::new(provider),
        )
    }

    fn completed_run(text: &str) -> MockRun {
        MockRun::new()
            .event(AssistantStreamEvent::RunCreated {
                run_id: "run_1".to_string(),
            })
            .event(AssistantStreamEvent::text_delta(text))
            .event(AssistantStreamEvent::RunCompleted {
                run_id: "run_1".to_string(),
                content: vec![],
            })
    }

    #[tokio::test]
    async fn init_creates_thread_once() {
        let chat = Arc::new(InMemoryChatPlatform::new());
        let agent = agent(chat, MockAssistantProvider::new());

        agent.init().await.unwrap();
        agent.init().await.unwrap();

        assert_eq!(agent.thread_id(), Some("thread_1"));
        assert_eq!(
            agent.state(),
            AgentState::OpenAi {
                assistant_id: "asst_1".to_string(),
                thread_id: Some("thread_1".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn init_propagates_provider_errors() {
        let chat = Arc::new(InMemoryChatPlatform::new());
        let agent = agent(
            chat,
            MockAssistantProvider::new().with_thread_error(AIError::AuthenticationFailed),
        );

        assert!(matches!(
            agent.init().await,
            Err(AgentError::Provider(AIError::AuthenticationFailed))
        ));
        assert_eq!(agent.thread_id(), None);
    }

    #[tokio::test]
    async fn handle_message_requires_init() {
        let chat = Arc::new(InMemoryChatPlatform::new());
        let agent = agent(chat, MockAssistantProvider::new());

        assert!(matches!(
            agent.handle_message("hi").await,
            Err(AgentError::NotInitialized)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn handle_message_relays_run_into_placeholder() {
        let chat = Arc::new(InMemoryChatPlatform::new());
        let agent = agent(
            chat.clone(),
            MockAssistantProvider::new().with_run(completed_run("Hello!")),
        );
        agent.init().await.unwrap();
        assert!(agent.last_interaction().await.is_none());

        agent.handle_message("Hi there").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let sent = chat.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.user_id, "ai-bot-general");
        assert!(sent[0].1.ai_generated);
        assert!(sent[0].1.text.is_empty());

        let updates = chat.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].message_id, sent[0].1.id);
        assert_eq!(updates[0].text, "Hello!");
        assert!(agent.last_interaction().await.is_some());
        assert_eq!(agent.active_relays(), 0);
    }

    #[tokio::test]
    async fn empty_message_is_ignored() {
        let chat = Arc::new(InMemoryChatPlatform::new());
        let agent = agent(chat.clone(), MockAssistantProvider::new());
        agent.init().await.unwrap();

        agent.handle_message("   ").await.unwrap();

        assert!(chat.sent_messages().is_empty());
        assert!(agent.last_interaction().await.is_none());
    }

    #[tokio::test]
    async fn stream_start_failure_is_reported_in_message() {
        let chat = Arc::new(InMemoryChatPlatform::new());
        let agent = agent(
            chat.clone(),
            MockAssistantProvider::new().with_stream_error(AIError::unavailable("down")),
        );
        agent.init().await.unwrap();

        let result = agent.handle_message("Hi").await;

        assert!(matches!(result, Err(AgentError::Provider(_))));
        assert_eq!(chat.update_texts(), vec!["provider unavailable: down"]);
        assert_eq!(agent.active_relays(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_shuts_down_live_relays() {
        let chat = Arc::new(InMemoryChatPlatform::new());
        let provider = MockAssistantProvider::new().with_run(
            MockRun::new()
                .event(AssistantStreamEvent::RunCreated {
                    run_id: "run_1".to_string(),
                })
                .hold_open(),
        );
        let agent = agent(chat.clone(), provider);
        agent.init().await.unwrap();
        agent.handle_message("long question").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(agent.active_relays(), 1);

        agent.dispose().await.unwrap();
        agent.dispose().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(agent.is_disposed());
        assert_eq!(agent.active_relays(), 0);
        let clears = chat
            .channel_events()
            .iter()
            .filter(|(_, e)| e.event_type() == "ai_indicator.clear")
            .count();
        assert_eq!(clears, 1);
        assert!(matches!(
            agent.handle_message("again").await,
            Err(AgentError::Disposed)
        ));
    }
}
