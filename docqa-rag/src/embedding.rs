//! Embedding provider trait for generating vector embeddings from text.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::{RagError, Result};
use crate::hash::HashEmbeddingProvider;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (OpenAI, Gemini, the
/// offline hash embedder) behind a unified async interface. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) implementation calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends that support
/// native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;
}

/// Build an embedding provider by name: `openai`, `gemini` or `hash`.
///
/// Hosted providers read their API key from the environment
/// (`OPENAI_API_KEY`, `GOOGLE_API_KEY`).
///
/// # Errors
///
/// Returns [`RagError::Configuration`] for unknown names or providers compiled
/// out by feature flags, and [`RagError::Embedding`] for missing keys.
pub fn load_embedding_model(name: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    let normalized = name.trim().to_ascii_lowercase();
    info!(provider = %normalized, "loading embedding model");
    match normalized.as_str() {
        "hash" | "local" => Ok(Arc::new(HashEmbeddingProvider::default())),
        "openai" => openai_provider(),
        "gemini" | "google" => gemini_provider(),
        other => Err(RagError::Configuration(format!(
            "unknown embedding model '{other}'; choose 'openai', 'gemini' or 'hash'"
        ))),
    }
}

#[cfg(feature = "openai")]
fn openai_provider() -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(crate::openai::OpenAIEmbeddingProvider::from_env()?))
}

#[cfg(not(feature = "openai"))]
fn openai_provider() -> Result<Arc<dyn EmbeddingProvider>> {
    Err(RagError::Configuration("the 'openai' embedding model requires the `openai` feature".into()))
}

#[cfg(feature = "gemini")]
fn gemini_provider() -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(crate::gemini::GeminiEmbeddingProvider::from_env()?))
}

#[cfg(not(feature = "gemini"))]
fn gemini_provider() -> Result<Arc<dyn EmbeddingProvider>> {
    Err(RagError::Configuration("the 'gemini' embedding model requires the `gemini` feature".into()))
}
