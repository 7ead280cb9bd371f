//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] holds its entries in a plain `Vec` that is
//! filled once at construction. Searches are brute-force, which is
//! appropriate for the size of a single uploaded document.

use async_trait::async_trait;

use crate::document::{Candidate, Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

#[derive(Debug, Clone)]
struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// An immutable in-memory vector store.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: Vec<Entry>,
    dimensions: usize,
}

impl InMemoryVectorStore {
    /// Create a store from `(chunk, embedding)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStore`] if any vector's length differs from
    /// `dimensions`.
    pub fn from_entries(
        dimensions: usize,
        entries: impl IntoIterator<Item = (Chunk, Vec<f32>)>,
    ) -> Result<Self> {
        let entries = entries
            .into_iter()
            .map(|(chunk, embedding)| {
                if embedding.len() != dimensions {
                    return Err(RagError::VectorStore {
                        backend: BACKEND.to_string(),
                        message: format!(
                            "chunk '{}' has {} dimensions, expected {dimensions}",
                            chunk.id,
                            embedding.len()
                        ),
                    });
                }
                Ok(Entry { chunk, embedding })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries, dimensions })
    }

    /// All stored chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    fn check_query(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(RagError::VectorStore {
                backend: BACKEND.to_string(),
                message: format!(
                    "query has {} dimensions, store has {}",
                    embedding.len(),
                    self.dimensions
                ),
            });
        }
        Ok(())
    }

    /// Indices of the `k` best entries, best first. Ties keep insertion order.
    fn ranked(&self, embedding: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&entry.embedding, embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.check_query(embedding)?;
        Ok(self
            .ranked(embedding, top_k)
            .into_iter()
            .map(|(i, score)| SearchResult { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }

    async fn candidates(&self, embedding: &[f32], fetch_k: usize) -> Result<Vec<Candidate>> {
        self.check_query(embedding)?;
        Ok(self
            .ranked(embedding, fetch_k)
            .into_iter()
            .map(|(i, score)| {
                let entry = &self.entries[i];
                Candidate {
                    result: SearchResult { chunk: entry.chunk.clone(), score },
                    embedding: entry.embedding.clone(),
                }
            })
            .collect())
    }
}
