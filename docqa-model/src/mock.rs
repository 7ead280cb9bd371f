//! Scripted chat model for tests and offline demos.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::model::ChatModel;
use crate::types::{ChatRequest, ChatResponse};

enum Scripted {
    Reply(String),
    Fail(String),
}

/// A [`ChatModel`] that replays scripted replies and records every request.
///
/// When the script is exhausted it answers `"Answer to: {last user message}"`.
///
/// # Example
///
/// ```rust
/// use docqa_model::{ChatMessage, ChatModel, ChatRequest, MockChatModel};
///
/// # tokio_test_block(async {
/// let model = MockChatModel::new().with_reply("Paris");
/// let reply = model.generate(ChatRequest::new(vec![ChatMessage::user("capital?")])).await.unwrap();
/// assert_eq!(reply.text, "Paris");
/// assert_eq!(model.call_count(), 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
/// # }
/// ```
#[derive(Default)]
pub struct MockChatModel {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(Scripted::Reply(text.into()));
        self
    }

    /// Queue a failure; the call consuming it returns [`ModelError::Mock`].
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail(message.into()));
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply on a shared instance.
    pub fn push_reply(&self, text: impl Into<String>) {
        self.push(Scripted::Reply(text.into()));
    }

    /// Queue a failure on a shared instance.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.push(Scripted::Fail(message.into()));
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// All requests received, in call order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, item: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let fallback = format!("Answer to: {}", request.last_user_text().unwrap_or_default());
        let next = self
            .script
            .lock()
            .map_err(|_| ModelError::Mock("script lock poisoned".into()))?
            .pop_front();

        self.requests
            .lock()
            .map_err(|_| ModelError::Mock("request log poisoned".into()))?
            .push(request);

        match next {
            Some(Scripted::Reply(text)) => Ok(ChatResponse { text, model: "mock".into() }),
            Some(Scripted::Fail(message)) => Err(ModelError::Mock(message)),
            None => Ok(ChatResponse { text: fallback, model: "mock".into() }),
        }
    }
}
