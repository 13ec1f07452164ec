//! Scripted provider for tests: canned replies, optional latency, and a log of
//! when each call started and finished.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Completion, LlmError, LlmProvider};

type Responder = Box<dyn Fn(&Completion<'_>) -> Result<String, LlmError> + Send + Sync>;
type Latency = Box<dyn Fn(&Completion<'_>) -> Duration + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    Started(String),
    Finished(String),
}

pub struct MockProvider {
    respond: Responder,
    latency: Latency,
    calls: AtomicUsize,
    events: Mutex<Vec<CallEvent>>,
}

impl MockProvider {
    pub fn new(
        respond: impl Fn(&Completion<'_>) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            latency: Box::new(|_| Duration::ZERO),
            calls: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Always replies with the same text.
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fails with an API error.
    pub fn failing(status: u16) -> Self {
        Self::new(move |_| {
            Err(LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            })
        })
    }

    pub fn with_latency(
        mut self,
        latency: impl Fn(&Completion<'_>) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.latency = Box::new(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().unwrap().clone()
    }
}

/// Pulls a `candidate-NN` marker out of a prompt, or `"?"`.
pub fn marker(prompt: &str) -> String {
    prompt
        .find("candidate-")
        .map(|idx| prompt[idx..].chars().take("candidate-".len() + 2).collect())
        .unwrap_or_else(|| "?".to_string())
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, request: &Completion<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tag = marker(request.prompt);
        self.events
            .lock()
            .unwrap()
            .push(CallEvent::Started(tag.clone()));

        let delay = (self.latency)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = (self.respond)(request);

        self.events.lock().unwrap().push(CallEvent::Finished(tag));
        result
    }
}
