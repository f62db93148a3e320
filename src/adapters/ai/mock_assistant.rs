//! Mock Assistant Provider for testing.
//!
//! Scripted implementation of the `AssistantProvider` port so relay and agent
//! tests run without calling a real assistant API.
//!
//! # Features
//!
//! - Scripted runs, consumed in order by `stream_run` and `submit_tool_outputs`
//! - Per-event delays (use with paused tokio time)
//! - Streams that stay open after their scripted events
//! - Slow thread creation
//! - Error injection and call tracking
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAssistantProvider::new().with_run(
//!     MockRun::new()
//!         .event(AssistantStreamEvent::RunCreated { run_id: "run_1".into() })
//!         .event(AssistantStreamEvent::text_delta("Hello"))
//!         .hold_open(),
//! );
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::assistant::{AssistantStreamEvent, ToolOutput};
use crate::ports::{AIError, AssistantEventStream, AssistantProvider};

/// One scripted stream.
#[derive(Debug, Clone, Default)]
pub struct MockRun {
    steps: Vec<(Duration, Result<AssistantStreamEvent, AIError>)>,
    hold_open: bool,
}

impl MockRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits an event immediately after the previous one.
    pub fn event(self, event: AssistantStreamEvent) -> Self {
        self.event_after(Duration::ZERO, event)
    }

    /// Emits an event `delay` after the previous one.
    pub fn event_after(mut self, delay: Duration, event: AssistantStreamEvent) -> Self {
        self.steps.push((delay, Ok(event)));
        self
    }

    /// Emits a stream error.
    pub fn error(mut self, error: AIError) -> Self {
        self.steps.push((Duration::ZERO, Err(error)));
        self
    }

    /// Keeps the stream pending after the scripted steps instead of ending it.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    fn into_stream(self) -> AssistantEventStream {
        let scripted = stream::iter(self.steps).then(|(delay, item)| async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            item
        });
        if self.hold_open {
            Box::pin(scripted.chain(stream::pending()))
        } else {
            Box::pin(scripted)
        }
    }
}

/// Mock assistant provider for testing.
#[derive(Debug, Clone, Default)]
pub struct MockAssistantProvider {
    runs: Arc<Mutex<VecDeque<MockRun>>>,
    thread_error: Option<AIError>,
    thread_delay: Duration,
    stream_error: Option<AIError>,
    cancel_error: Option<AIError>,
    threads_created: Arc<Mutex<usize>>,
    messages: Arc<Mutex<Vec<(String, String)>>>,
    cancels: Arc<Mutex<Vec<(String, String)>>>,
    submissions: Arc<Mutex<Vec<(String, Vec<ToolOutput>)>>>,
}

impl MockAssistantProvider {
    /// Creates a mock whose runs end immediately until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a scripted stream.
    pub fn with_run(self, run: MockRun) -> Self {
        self.runs.lock().unwrap().push_back(run);
        self
    }

    /// Makes `create_thread` fail.
    pub fn with_thread_error(mut self, error: AIError) -> Self {
        self.thread_error = Some(error);
        self
    }

    /// Makes `create_thread` take `delay` before answering.
    pub fn with_thread_delay(mut self, delay: Duration) -> Self {
        self.thread_delay = delay;
        self
    }

    /// Makes `stream_run` fail before returning a stream.
    pub fn with_stream_error(mut self, error: AIError) -> Self {
        self.stream_error = Some(error);
        self
    }

    /// Makes `cancel_run` fail.
    pub fn with_cancel_error(mut self, error: AIError) -> Self {
        self.cancel_error = Some(error);
        self
    }

    // === Call tracking ===

    pub fn threads_created(&self) -> usize {
        *self.threads_created.lock().unwrap()
    }

    /// `(thread_id, text)` for every user message added.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// `(thread_id, run_id)` for every cancel request.
    pub fn cancels(&self) -> Vec<(String, String)> {
        self.cancels.lock().unwrap().clone()
    }

    /// `(run_id, outputs)` for every tool output submission.
    pub fn submissions(&self) -> Vec<(String, Vec<ToolOutput>)> {
        self.submissions.lock().unwrap().clone()
    }

    fn next_stream(&self) -> AssistantEventStream {
        self.runs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default()
            .into_stream()
    }
}

#[async_trait]
impl AssistantProvider for MockAssistantProvider {
    async fn create_thread(&self) -> Result<String, AIError> {
        if !self.thread_delay.is_zero() {
            sleep(self.thread_delay).await;
        }
        if let Some(error) = &self.thread_error {
            return Err(error.clone());
        }
        let mut count = self.threads_created.lock().unwrap();
        *count += 1;
        Ok(format!("thread_{}", *count))
    }

    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<(), AIError> {
        self.messages
            .lock()
            .unwrap()
            .push((thread_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn stream_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
    ) -> Result<AssistantEventStream, AIError> {
        if let Some(error) = &self.stream_error {
            return Err(error.clone());
        }
        Ok(self.next_stream())
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<AssistantEventStream, AIError> {
        self.submissions
            .lock()
            .unwrap()
            .push((run_id.to_string(), outputs));
        Ok(self.next_stream())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), AIError> {
        self.cancels
            .lock()
            .unwrap()
            .push((thread_id.to_string(), run_id.to_string()));
        match &self.cancel_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_runs_are_consumed_in_order() {
        let provider = MockAssistantProvider::new()
            .with_run(MockRun::new().event(AssistantStreamEvent::text_delta("first")))
            .with_run(MockRun::new().event(AssistantStreamEvent::text_delta("second")));

        let first: Vec<_> = provider.stream_run("t", "a").await.unwrap().collect().await;
        let second: Vec<_> = provider
            .submit_tool_outputs("t", "run_1", vec![])
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(first, vec![Ok(AssistantStreamEvent::text_delta("first"))]);
        assert_eq!(second, vec![Ok(AssistantStreamEvent::text_delta("second"))]);
        assert_eq!(provider.submissions().len(), 1);
    }

    #[tokio::test]
    async fn unscripted_run_ends_immediately() {
        let provider = MockAssistantProvider::new();
        let events: Vec<_> = provider.stream_run("t", "a").await.unwrap().collect().await;
        assert!(events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_events_wait() {
        let provider = MockAssistantProvider::new().with_run(
            MockRun::new().event_after(Duration::from_millis(500), AssistantStreamEvent::text_delta("x")),
        );
        let started = tokio::time::Instant::now();
        let events: Vec<_> = provider.stream_run("t", "a").await.unwrap().collect().await;

        assert_eq!(events.len(), 1);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn records_threads_messages_and_cancels() {
        let provider = MockAssistantProvider::new().with_cancel_error(AIError::network("down"));

        let thread = provider.create_thread().await.unwrap();
        provider.add_user_message(&thread, "hi").await.unwrap();
        let cancel = provider.cancel_run(&thread, "run_1").await;

        assert_eq!(thread, "thread_1");
        assert_eq!(provider.threads_created(), 1);
        assert_eq!(provider.messages(), vec![("thread_1".to_string(), "hi".to_string())]);
        assert_eq!(provider.cancels(), vec![("thread_1".to_string(), "run_1".to_string())]);
        assert!(cancel.is_err());
    }

    #[tokio::test]
    async fn injected_errors_are_returned() {
        let provider = MockAssistantProvider::new()
            .with_thread_error(AIError::AuthenticationFailed)
            .with_stream_error(AIError::unavailable("down"));

        assert_eq!(provider.create_thread().await, Err(AIError::AuthenticationFailed));
        assert!(provider.stream_run("t", "a").await.is_err());
    }
}
