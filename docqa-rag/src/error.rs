//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while indexing documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid splitter, retriever or chain parameters, detected at construction.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The declared MIME type has no loader.
    #[error("Unsupported file type: {0} (expected text/plain or application/pdf)")]
    UnsupportedFileType(String),

    /// The file could not be read or parsed.
    #[error("Failed to load '{path}': {message}")]
    LoadFailed {
        /// Path of the file being loaded.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// Embedding or indexing failed; no store was produced.
    #[error("Failed to build vector store: {0}")]
    BuildFailed(String),

    /// The retriever search type is not `similarity` or `mmr`.
    #[error("Unknown search type: {0}. Please choose from 'similarity' or 'mmr'.")]
    UnknownSearchType(String),

    /// Embedding the query or searching the store failed.
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    /// The language model call failed or timed out.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// No session is registered under this id.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The session already has an index; re-indexing is not supported.
    #[error("Session {0} already has an indexed document")]
    AlreadyIndexed(String),
}

/// A convenience result type for docqa-rag operations.
pub type Result<T> = std::result::Result<T, RagError>;
