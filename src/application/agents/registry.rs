//! Agent registry - one running agent per channel.
//!
//! Agents are keyed by channel cid. Starting is idempotent; stopping disposes
//! the agent and forgets it.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::OpenAIAgent;
use crate::domain::agent::{AgentBinding, AgentPlatform};
use crate::domain::chat::{ChannelRef, ChatEvent};
use crate::ports::{AgentError, AssistantProvider, ChatAgent, ChatPlatform, WebSearch};

/// Builds agents for a platform.
pub struct AgentFactory {
    chat: Arc<dyn ChatPlatform>,
    provider: Option<Arc<dyn AssistantProvider>>,
    assistant_id: Option<String>,
    web_search: Option<Arc<dyn WebSearch>>,
}

impl AgentFactory {
    pub fn new(chat: Arc<dyn ChatPlatform>) -> Self {
        Self {
            chat,
            provider: None,
            assistant_id: None,
            web_search: None,
        }
    }

    /// Configures the OpenAI platform.
    pub fn with_openai(
        mut self,
        provider: Arc<dyn AssistantProvider>,
        assistant_id: impl Into<String>,
    ) -> Self {
        self.provider = Some(provider);
        self.assistant_id = Some(assistant_id.into());
        self
    }

    pub fn with_web_search(mut self, web_search: Arc<dyn WebSearch>) -> Self {
        self.web_search = Some(web_search);
        self
    }

    /// Creates an uninitialized agent bound to `channel`.
    pub fn create(
        &self,
        platform: AgentPlatform,
        channel: ChannelRef,
    ) -> Result<Arc<dyn ChatAgent>, AgentError> {
        match platform {
            AgentPlatform::OpenAi => {
                let provider = self
                    .provider
                    .clone()
                    .ok_or(AgentError::NotConfigured("OPENAI_API_KEY"))?;
                let assistant_id = self
                    .assistant_id
                    .clone()
                    .ok_or(AgentError::NotConfigured("OPENAI_ASSISTANT_ID"))?;

                let mut agent = OpenAIAgent::new(
                    AgentBinding::for_channel(channel),
                    assistant_id,
                    Arc::clone(&self.chat),
                    provider,
                );
                if let Some(web_search) = &self.web_search {
                    agent = agent.with_web_search(Arc::clone(web_search));
                }
                Ok(Arc::new(agent))
            }
            AgentPlatform::WritingAssistant => Err(AgentError::UnsupportedPlatform(platform)),
        }
    }
}

/// Running agents keyed by channel cid.
pub struct AgentRegistry {
    factory: AgentFactory,
    agents: RwLock<HashMap<String, Arc<dyn ChatAgent>>>,
}

impl AgentRegistry {
    pub fn new(factory: AgentFactory) -> Self {
        Self {
            factory,
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Starts an agent for `channel`, or returns the one already running.
    ///
    /// The agent is initialized without holding the registry lock; when two
    /// starts race, the first to register wins and the other is disposed.
    pub async fn start(
        &self,
        platform: AgentPlatform,
        channel: ChannelRef,
    ) -> Result<Arc<dyn ChatAgent>, AgentError> {
        let cid = channel.cid();
        if let Some(agent) = self.get(&cid).await {
            tracing::debug!(cid = %cid, "Agent already running");
            return Ok(agent);
        }

        let agent = self.factory.create(platform, channel)?;
        agent.init().await?;

        let mut agents = self.agents.write().await;
        if let Some(existing) = agents.get(&cid) {
            let existing = Arc::clone(existing);
            drop(agents);
            tracing::debug!(cid = %cid, "Agent started concurrently, discarding duplicate");
            if let Err(error) = agent.dispose().await {
                tracing::warn!(cid = %cid, error = %error, "Failed to dispose duplicate agent");
            }
            return Ok(existing);
        }
        agents.insert(cid.clone(), Arc::clone(&agent));
        drop(agents);

        tracing::info!(cid = %cid, platform = %platform, "Agent started");
        Ok(agent)
    }

    /// Disposes and removes the channel's agent. Returns false if none ran.
    pub async fn stop(&self, channel: &ChannelRef) -> Result<bool, AgentError> {
        let removed = self.agents.write().await.remove(&channel.cid());
        match removed {
            Some(agent) => {
                agent.dispose().await?;
                tracing::info!(cid = %channel, "Agent stopped");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn get(&self, cid: &str) -> Option<Arc<dyn ChatAgent>> {
        self.agents.read().await.get(cid).cloned()
    }

    pub async fn count(&self) -> usize {
        self.agents.read().await.len()
    }

    /// Routes a `message.new` event to the channel's agent.
    ///
    /// Skips AI-generated messages and messages authored by the agent's own
    /// bot user. Returns whether the agent was asked to answer.
    pub async fn dispatch(&self, event: &ChatEvent) -> Result<bool, AgentError> {
        if event.event_type != ChatEvent::MESSAGE_NEW {
            return Ok(false);
        }
        let Some(message) = &event.message else {
            return Ok(false);
        };
        let Some(channel) = event.channel() else {
            return Ok(false);
        };
        let Some(agent) = self.get(&channel.cid()).await else {
            return Ok(false);
        };
        if message.ai_generated || event.author_id() == Some(agent.binding().user_id.as_str()) {
            return Ok(false);
        }

        agent.handle_message(&message.text).await?;
        Ok(true)
    }

    /// Disposes every agent.
    pub async fn shutdown(&self) {
        let agents: Vec<_> = self.agents.write().await.drain().collect();
        for (cid, agent) in agents {
            if let Err(error) = agent.dispose().await {
                tracing::warn!(cid = %cid, error = %error, "Failed to dispose agent");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAssistantProvider, MockRun};
    use crate::adapters::chat::InMemoryChatPlatform;
    use crate::domain::assistant::AssistantStreamEvent;
    use crate::domain::chat::{EventMessage, EventUser};
    use crate::ports::AIError;
    use std::time::Duration;

    fn registry(provider: MockAssistantProvider) -> (AgentRegistry, Arc<InMemoryChatPlatform>) {
        let chat = Arc::new(InMemoryChatPlatform::new());
        let factory = AgentFactory::new(chat.clone()).with_openai(Arc::new(provider), "asst_1");
        (AgentRegistry::new(factory), chat)
    }

    fn general() -> ChannelRef {
        ChannelRef::new("messaging", "general")
    }

    fn message_new(user_id: &str, text: &str, ai_generated: bool) -> ChatEvent {
        ChatEvent {
            cid: Some("messaging:general".to_string()),
            message: Some(EventMessage {
                id: "user-msg".to_string(),
                text: text.to_string(),
                user: Some(EventUser {
                    id: user_id.to_string(),
                }),
                ai_generated,
            }),
            ..ChatEvent::new(ChatEvent::MESSAGE_NEW)
        }
    }

    #[tokio::test]
    async fn start_is_idempotent_per_channel() {
        let (registry, _chat) = registry(MockAssistantProvider::new());

        let first = registry.start(AgentPlatform::OpenAi, general()).await.unwrap();
        let second = registry.start(AgentPlatform::OpenAi, general()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn writing_assistant_is_unsupported() {
        let (registry, _chat) = registry(MockAssistantProvider::new());

        let result = registry
            .start(AgentPlatform::WritingAssistant, general())
            .await;

        assert!(matches!(
            result,
            Err(AgentError::UnsupportedPlatform(AgentPlatform::WritingAssistant))
        ));
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn unconfigured_openai_is_reported() {
        let registry = AgentRegistry::new(AgentFactory::new(Arc::new(InMemoryChatPlatform::new())));

        assert!(matches!(
            registry.start(AgentPlatform::OpenAi, general()).await,
            Err(AgentError::NotConfigured("OPENAI_API_KEY"))
        ));
    }

    #[tokio::test]
    async fn failed_init_does_not_register() {
        let (registry, _chat) =
            registry(MockAssistantProvider::new().with_thread_error(AIError::AuthenticationFailed));

        assert!(registry.start(AgentPlatform::OpenAi, general()).await.is_err());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn stop_disposes_and_forgets() {
        let (registry, _chat) = registry(MockAssistantProvider::new());
        registry.start(AgentPlatform::OpenAi, general()).await.unwrap();

        assert!(registry.stop(&general()).await.unwrap());
        assert!(!registry.stop(&general()).await.unwrap());
        assert!(registry.get("messaging:general").await.is_none());
    }

    #[tokio::test]
    async fn dispatch_routes_user_messages_only() {
        let provider = MockAssistantProvider::new().with_run(
            MockRun::new().event(AssistantStreamEvent::RunCompleted {
                run_id: "run_1".to_string(),
                content: vec![],
            }),
        );
        let (registry, chat) = registry(provider);

        assert!(!registry
            .dispatch(&message_new("alice", "hello", false))
            .await
            .unwrap());

        registry.start(AgentPlatform::OpenAi, general()).await.unwrap();

        assert!(!registry
            .dispatch(&message_new("ai-bot-general", "echo", false))
            .await
            .unwrap());
        assert!(!registry
            .dispatch(&message_new("alice", "generated", true))
            .await
            .unwrap());
        assert!(!registry
            .dispatch(&ChatEvent::stop_generating("msg-1"))
            .await
            .unwrap());
        assert!(registry
            .dispatch(&message_new("alice", "hello", false))
            .await
            .unwrap());
        assert_eq!(chat.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_disposes_all() {
        let (registry, _chat) = registry(MockAssistantProvider::new());
        let agent = registry.start(AgentPlatform::OpenAi, general()).await.unwrap();

        registry.shutdown().await;

        assert_eq!(registry.count().await, 0);
        assert!(matches!(
            agent.handle_message("hi").await,
            Err(AgentError::Disposed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_init_does_not_block_other_channels() {
        let (registry, _chat) = registry(
            MockAssistantProvider::new().with_thread_delay(Duration::from_secs(30)),
        );
        let registry = Arc::new(registry);
        let slow = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move {
                registry
                    .start(AgentPlatform::OpenAi, ChannelRef::new("messaging", "slow"))
                    .await
                    .map(|_| ())
            }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        let lookup =
            tokio::time::timeout(Duration::from_secs(5), registry.get("messaging:other")).await;
        let stop = tokio::time::timeout(
            Duration::from_secs(5),
            registry.stop(&ChannelRef::new("messaging", "other")),
        )
        .await;

        assert!(matches!(lookup, Ok(None)));
        assert!(matches!(stop, Ok(Ok(false))));
        slow.await.unwrap().unwrap();
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_starts_keep_one_agent() {
        let provider = MockAssistantProvider::new().with_thread_delay(Duration::from_secs(1));
        let (registry, _chat) = registry(provider.clone());

        let (first, second) = tokio::join!(
            registry.start(AgentPlatform::OpenAi, general()),
            registry.start(AgentPlatform::OpenAi, general()),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.count().await, 1);
        assert_eq!(provider.threads_created(), 2);
        assert!(first.handle_message("   ").await.is_ok());
    }
}
