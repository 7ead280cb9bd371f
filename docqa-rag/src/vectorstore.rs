//! Vector store trait for searching stored chunk embeddings.

use async_trait::async_trait;

use crate::document::{Candidate, SearchResult};
use crate::error::Result;

/// A read-only, similarity-searchable collection of embedded chunks.
///
/// Stores are populated once by the
/// [`VectorStoreBuilder`](crate::builder::VectorStoreBuilder) and never
/// mutated afterwards, so searches need no write coordination.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::VectorStore;
///
/// let results = store.search(&query_embedding, 5).await?;
/// assert!(results.windows(2).all(|w| w[0].distance() <= w[1].distance()));
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Number of stored chunks.
    fn len(&self) -> usize;

    /// Whether the store holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the stored vectors.
    fn dimensions(&self) -> usize;

    /// Return the `top_k` chunks nearest to `embedding`, ordered by ascending
    /// cosine distance (descending similarity).
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Like [`search`](VectorStore::search) but also returns each chunk's
    /// stored vector, for diversity re-ranking.
    async fn candidates(&self, embedding: &[f32], fetch_k: usize) -> Result<Vec<Candidate>>;
}
