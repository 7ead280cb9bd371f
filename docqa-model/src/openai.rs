//! OpenAI chat completions client.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::model::ChatModel;
use crate::types::{ChatRequest, ChatResponse};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "OpenAI";

/// A [`ChatModel`] backed by the OpenAI `/chat/completions` endpoint.
///
/// Works against any OpenAI-compatible server (vLLM, Ollama, LM Studio)
/// via [`OpenAIChatModel::with_base_url`].
///
/// # Example
///
/// ```rust,ignore
/// use docqa_model::OpenAIChatModel;
///
/// let model = OpenAIChatModel::new("sk-...", "gpt-3.5-turbo")?;
/// ```
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIChatModel {
    /// Create a new client with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::Config("OpenAI API key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: OPENAI_API_BASE.into(),
        })
    }

    /// Create a new client using the `OPENAI_API_KEY` environment variable.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ModelError::Config("OPENAI_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key, model)
    }

    /// Point the client at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn build_request<'a>(model: &'a str, request: &'a ChatRequest) -> CompletionRequest<'a> {
    CompletionRequest {
        model,
        messages: request
            .messages
            .iter()
            .map(|m| WireMessage { role: m.role.as_str(), content: &m.content })
            .collect(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

fn parse_response(body: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(body).map_err(|e| {
        ModelError::Parse { provider: PROVIDER.into(), message: e.to_string() }
    })?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ModelError::EmptyResponse(PROVIDER.into()))
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            message_count = request.messages.len(),
            "sending chat completion"
        );

        let body = build_request(&self.model, &request);
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                ModelError::Request { provider: PROVIDER.into(), message: e.to_string() }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ModelError::Request {
            provider: PROVIDER.into(),
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            error!(provider = PROVIDER, %status, "API error");
            return Err(ModelError::Api {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                message: detail,
            });
        }

        let text = parse_response(&text)?;
        Ok(ChatResponse { text, model: self.model.clone() })
    }
}
