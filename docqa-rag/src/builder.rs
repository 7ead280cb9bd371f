//! Embeds chunks and assembles them into a searchable [`VectorIndex`].

use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::document::Chunk;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorStore;
use crate::retriever::{Retriever, SearchOptions};
use crate::vectorstore::VectorStore;

/// Default number of chunk texts sent per embedding request.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// A built store together with the embedder needed to query it.
#[derive(Clone)]
pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndex")
            .field("chunks", &self.store.len())
            .field("dimensions", &self.store.dimensions())
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

impl VectorIndex {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Create a [`Retriever`] over this index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnknownSearchType`] or [`RagError::Configuration`]
    /// immediately; a retriever that constructs successfully never fails on
    /// configuration at query time.
    pub fn as_retriever(&self, search_type: &str, options: SearchOptions) -> Result<Retriever> {
        Retriever::new(self.clone(), search_type, options)
    }
}

/// Builds a [`VectorIndex`] from chunks.
///
/// Every chunk is embedded before the store is created, so a failure part way
/// through leaves nothing behind.
pub struct VectorStoreBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl VectorStoreBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder, batch_size: DEFAULT_BATCH_SIZE }
    }

    /// Set how many chunks are embedded per request. Zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embed `chunks` and index them.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::BuildFailed`] if there are no chunks, the embedder
    /// fails, or it returns the wrong number or size of vectors.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<VectorIndex> {
        if chunks.is_empty() {
            return Err(RagError::BuildFailed("no content to index".to_string()));
        }

        let dimensions = self.embedder.dimensions();
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
                error!(provider = self.embedder.name(), error = %e, "embedding failed during build");
                RagError::BuildFailed(e.to_string())
            })?;
            if vectors.len() != batch.len() {
                return Err(RagError::BuildFailed(format!(
                    "embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
                return Err(RagError::BuildFailed(format!(
                    "embedder returned a {}-dimensional vector, expected {dimensions}",
                    bad.len()
                )));
            }
            embeddings.extend(vectors);
        }

        let chunk_count = chunks.len();
        let store = InMemoryVectorStore::from_entries(dimensions, chunks.into_iter().zip(embeddings))
            .map_err(|e| RagError::BuildFailed(e.to_string()))?;

        info!(chunk_count, dimensions, provider = self.embedder.name(), "vector store built");
        Ok(VectorIndex::new(Arc::new(store), self.embedder.clone()))
    }
}
