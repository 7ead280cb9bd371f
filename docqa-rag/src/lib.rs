//! # docqa-rag
//!
//! Retrieval-augmented question answering over a single uploaded document.
//!
//! ## Overview
//!
//! A file is loaded ([`load_file`]), split into overlapping chunks
//! ([`Chunker`]), embedded and indexed ([`VectorStoreBuilder`]), and queried
//! through a [`Retriever`] (plain similarity or MMR). A
//! [`ConversationalRetrievalChain`] turns retrieved chunks into an answer with
//! cited sources and remembers the conversation.
//!
//! [`SessionManager`] ties the pieces together per user: each session is
//! Idle until a file is uploaded, then Ready to answer questions.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use docqa_model::MockChatModel;
//! use docqa_rag::{FileUpload, HashEmbeddingProvider, SessionDeps, SessionManager};
//!
//! let deps = SessionDeps::new(
//!     Arc::new(HashEmbeddingProvider::default()),
//!     Arc::new(MockChatModel::new()),
//! );
//! let manager = SessionManager::new(deps);
//! let id = manager.create_session().await;
//! manager.upload_file(&id, FileUpload::new("report.pdf", "application/pdf")).await?;
//! let answer = manager.ask(&id, "What is the conclusion?").await?;
//! println!("{}", answer.render());
//! ```
//!
//! ## Features
//!
//! - `openai` - [`OpenAIEmbeddingProvider`]
//! - `gemini` - [`GeminiEmbeddingProvider`]
//! - `full` - both

pub mod builder;
pub mod chain;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod hash;
pub mod inmemory;
pub mod loader;
pub mod memory;
pub mod mmr;
#[cfg(feature = "openai")]
pub mod openai;
pub mod prompt;
pub mod retriever;
pub mod session;
pub mod vectorstore;

pub use builder::{VectorIndex, VectorStoreBuilder};
pub use chain::{Answer, ChainOptions, ConversationalRetrievalChain, SourceRef};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, SplitterKind};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::{EmbeddingProvider, load_embedding_model};
pub use error::{RagError, Result};
#[cfg(feature = "gemini")]
pub use gemini::GeminiEmbeddingProvider;
pub use hash::HashEmbeddingProvider;
pub use inmemory::InMemoryVectorStore;
pub use loader::{APPLICATION_PDF, FileKind, TEXT_PLAIN, load_file};
pub use memory::{ConversationMemory, Turn};
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use retriever::{Retriever, SearchOptions, SearchType};
pub use session::{
    FileUpload, IDLE_MESSAGE, Session, SessionDeps, SessionId, SessionManager, SessionState,
    UploadReport,
};
pub use vectorstore::VectorStore;
