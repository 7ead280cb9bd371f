//! Conversational retrieval chain: retrieve, prompt, generate, remember.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use docqa_model::{ChatModel, ChatRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::memory::ConversationMemory;
use crate::prompt::{answer_messages, condense_messages};
use crate::retriever::Retriever;

/// Behaviour switches for [`ConversationalRetrievalChain`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainOptions {
    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub condense_question: bool,
    /// Upper bound on each model call.
    #[serde(with = "duration_secs")]
    pub generation_timeout: Duration,
    /// Sampling temperature passed to the model, if set.
    pub temperature: Option<f32>,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self { condense_question: true, generation_timeout: Duration::from_secs(120), temperature: None }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// A chunk cited by an [`Answer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Stable label assigned at split time, e.g. `source_3`.
    pub label: String,
    /// The chunk text.
    pub excerpt: String,
    /// Zero-based PDF page the chunk came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// The reply to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

impl Answer {
    /// An answer with no sources.
    pub fn without_sources(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), sources: Vec::new() }
    }

    /// The answer followed by a `Sources:` line, or `No sources found`.
    pub fn render(&self) -> String {
        if self.sources.is_empty() {
            format!("{}\nNo sources found", self.answer)
        } else {
            let labels: Vec<&str> = self.sources.iter().map(|s| s.label.as_str()).collect();
            format!("{}\nSources: {}", self.answer, labels.join(", "))
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Answers questions about an indexed document, keeping conversation history.
///
/// `ask` takes `&mut self`: a chain serves one conversation and its memory is
/// only ever updated by one question at a time.
pub struct ConversationalRetrievalChain {
    retriever: Retriever,
    model: Arc<dyn ChatModel>,
    memory: ConversationMemory,
    options: ChainOptions,
}

impl fmt::Debug for ConversationalRetrievalChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationalRetrievalChain")
            .field("retriever", &self.retriever)
            .field("model", &self.model.name())
            .field("turns", &self.memory.len())
            .field("options", &self.options)
            .finish()
    }
}

impl ConversationalRetrievalChain {
    pub fn new(retriever: Retriever, model: Arc<dyn ChatModel>) -> Self {
        Self { retriever, model, memory: ConversationMemory::new(), options: ChainOptions::default() }
    }

    pub fn with_options(mut self, options: ChainOptions) -> Self {
        self.options = options;
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn options(&self) -> &ChainOptions {
        &self.options
    }

    /// Answer `question` from the indexed document.
    ///
    /// On success the turn is appended to memory. On any error memory is left
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`RagError::RetrievalFailed`] if retrieval fails
    /// - [`RagError::GenerationFailed`] if a model call fails or times out
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let standalone = if self.options.condense_question && !self.memory.is_empty() {
            let rewritten = self.generate(condense_messages(&self.memory, question)).await?;
            debug!(original = question, standalone = %rewritten, "condensed question");
            rewritten
        } else {
            question.to_string()
        };

        let results = self.retriever.retrieve(&standalone).await?;
        let answer = self.generate(answer_messages(&results, &self.memory, question)).await?;

        self.memory.push(question, answer.clone());
        let sources = source_refs(&results);
        info!(source_count = sources.len(), turn = self.memory.len(), "answered question");
        Ok(Answer { answer, sources })
    }

    async fn generate(&self, messages: Vec<docqa_model::ChatMessage>) -> Result<String> {
        let mut request = ChatRequest::new(messages);
        if let Some(temperature) = self.options.temperature {
            request = request.with_temperature(temperature);
        }

        let timeout = self.options.generation_timeout;
        match tokio::time::timeout(timeout, self.model.generate(request)).await {
            Ok(Ok(response)) => Ok(response.text.trim().to_string()),
            Ok(Err(e)) => {
                error!(model = self.model.name(), error = %e, "generation failed");
                Err(RagError::GenerationFailed(e.to_string()))
            }
            Err(_) => {
                error!(model = self.model.name(), timeout_secs = timeout.as_secs(), "generation timed out");
                Err(RagError::GenerationFailed(format!("model call timed out after {timeout:?}")))
            }
        }
    }
}

/// Cited sources in retrieval order, one per chunk.
fn source_refs(results: &[SearchResult]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| seen.insert(r.chunk.id.as_str()))
        .map(|r| SourceRef {
            label: r.chunk.source_label().unwrap_or(&r.chunk.id).to_string(),
            excerpt: r.chunk.text.clone(),
            page: r.chunk.page(),
        })
        .collect()
}
