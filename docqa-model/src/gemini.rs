//! Gemini `generateContent` client.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::model::ChatModel;
use crate::types::{ChatRequest, ChatResponse, Role};

/// The default Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "Gemini";

/// A [`ChatModel`] backed by the Gemini REST API.
///
/// System messages are sent as `systemInstruction`; assistant turns are
/// mapped to the `model` role.
pub struct GeminiChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::Config("Gemini API key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: GEMINI_API_BASE.into(),
        })
    }

    /// Create a new client using the `GOOGLE_API_KEY` environment variable.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| {
            ModelError::Config("GOOGLE_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key, model)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn build_request(request: &ChatRequest) -> GenerateRequest<'_> {
    let system_parts: Vec<Part<'_>> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| Part { text: &m.content })
        .collect();

    let contents = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| Content {
            role: Some(if m.role == Role::Assistant { "model" } else { "user" }),
            parts: vec![Part { text: &m.content }],
        })
        .collect();

    let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
        Some(GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
        })
    } else {
        None
    };

    GenerateRequest {
        contents,
        system_instruction: (!system_parts.is_empty())
            .then_some(Content { role: None, parts: system_parts }),
        generation_config,
    }
}

fn parse_response(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        ModelError::Parse { provider: PROVIDER.into(), message: e.to_string() }
    })?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ModelError::EmptyResponse(PROVIDER.into()));
    }
    Ok(text)
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            message_count = request.messages.len(),
            "sending generateContent"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(&request))
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                ModelError::Request { provider: PROVIDER.into(), message: e.to_string() }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ModelError::Request {
            provider: PROVIDER.into(),
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = PROVIDER, %status, "API error");
            return Err(ModelError::Api {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                message: detail,
            });
        }

        let text = parse_response(&body)?;
        Ok(ChatResponse { text, model: self.model.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    #[test]
    fn system_messages_become_system_instruction() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("answer from context"),
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ]);

        let value = serde_json::to_value(build_request(&request)).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "answer from context");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"].as_array().unwrap().len(), 3);
        assert_eq!(value["contents"][1]["role"], "model");
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn concatenates_candidate_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Hello");
    }

    #[test]
    fn blocked_prompt_has_no_candidates() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(parse_response(body), Err(ModelError::EmptyResponse(_))));
    }

    #[test]
    fn url_contains_model() {
        let model = GeminiChatModel::new("key", "gemini-1.5-pro").unwrap();
        assert!(model.generate_url().ends_with("/models/gemini-1.5-pro:generateContent"));
    }
}
