//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the chunk's sequential source label (`source_{i}`).
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the zero-based PDF page number.
pub const PAGE_KEY: &str = "page";
/// Metadata key holding the path of the file a chunk came from.
pub const FILE_KEY: &str = "file";
/// Metadata key holding the chunk's character offset inside its document.
pub const START_INDEX_KEY: &str = "start_index";
/// Metadata key holding the chunk's position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A loaded document: text content plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata (`source` path, `page` number, ...).
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The zero-based page number, for documents loaded from a PDF.
    pub fn page(&self) -> Option<u32> {
        self.metadata.get(PAGE_KEY).and_then(|p| p.parse().ok())
    }
}

/// A bounded-size segment of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

impl Chunk {
    /// The stable source label assigned at split time.
    pub fn source_label(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    pub fn page(&self) -> Option<u32> {
        self.metadata.get(PAGE_KEY).and_then(|p| p.parse().ok())
    }

    /// Character offset of this chunk inside the parent document.
    pub fn start_index(&self) -> Option<usize> {
        self.metadata.get(START_INDEX_KEY).and_then(|s| s.parse().ok())
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

impl SearchResult {
    /// Cosine distance to the query (lower is more relevant).
    pub fn distance(&self) -> f32 {
        1.0 - self.score
    }
}

/// A search result carrying its stored vector, used for diversity re-ranking.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub result: SearchResult,
    pub embedding: Vec<f32>,
}
