//! Per-user document sessions and the manager that owns them.
//!
//! A [`Session`] starts [`Idle`](SessionState::Idle). Uploading a file loads,
//! splits and indexes it, then moves the session to
//! [`Ready`](SessionState::Ready) with a fresh conversational chain. Any
//! failure along the way leaves the session Idle.
//!
//! [`SessionManager`] hands out sessions keyed by UUID. Each session sits
//! behind its own async mutex, so uploads and questions on one session run
//! one after another while different sessions proceed independently.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_model::ChatModel;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::builder::VectorStoreBuilder;
use crate::chain::{Answer, ConversationalRetrievalChain};
use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::{FileKind, load_kind};
use crate::memory::Turn;

/// Reply to a question asked before any file was indexed.
pub const IDLE_MESSAGE: &str = "No active chain. Please upload a file first.";

pub type SessionId = String;

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionDeps {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub model: Arc<dyn ChatModel>,
    pub config: RagConfig,
}

impl SessionDeps {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, model: Arc<dyn ChatModel>) -> Self {
        Self { embedder, model, config: RagConfig::default() }
    }

    /// Replace the default config after validating it.
    ///
    /// # Errors
    ///
    /// Whatever [`RagConfig::validate`] reports.
    pub fn with_config(mut self, config: RagConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }
}

impl fmt::Debug for SessionDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDeps")
            .field("embedder", &self.embedder.name())
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

/// A file handed to a session, with its declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub path: PathBuf,
    pub mime: String,
}

impl FileUpload {
    pub fn new(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Self { path: path.into(), mime: mime.into() }
    }

    /// Declare the MIME type from the file extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mime = FileKind::from_path(&path)?.mime();
        Ok(Self::new(path, mime))
    }

    /// File name for user-facing messages.
    pub fn name(&self) -> String {
        display_name(&self.path)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// What an upload produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub file_name: String,
    pub kind: FileKind,
    pub document_count: usize,
    pub chunk_count: usize,
}

/// Where a session is in its lifecycle.
pub enum SessionState {
    Idle,
    Ready(Box<ConversationalRetrievalChain>),
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Ready(chain) => f.debug_tuple("Ready").field(chain).finish(),
        }
    }
}

/// One user's document and conversation.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    deps: SessionDeps,
    state: SessionState,
}

impl Session {
    pub fn new(id: impl Into<SessionId>, deps: SessionDeps) -> Self {
        Self { id: id.into(), deps, state: SessionState::Idle }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready(_))
    }

    /// Index `upload` and make the session Ready.
    ///
    /// # Errors
    ///
    /// - [`RagError::AlreadyIndexed`] if the session is already Ready
    /// - [`RagError::Configuration`] or [`RagError::UnknownSearchType`] for
    ///   an invalid config, before the file is read
    /// - [`RagError::UnsupportedFileType`] or [`RagError::LoadFailed`] from the loader
    /// - [`RagError::BuildFailed`] if embedding or indexing fails
    ///
    /// The session stays Idle on every error.
    pub async fn upload_file(&mut self, upload: &FileUpload) -> Result<UploadReport> {
        if self.is_ready() {
            return Err(RagError::AlreadyIndexed(self.id.clone()));
        }

        // Reject a bad config before reading or embedding anything.
        let config = &self.deps.config;
        config.validate()?;
        let kind = FileKind::from_mime(&upload.mime)?;
        info!(session_id = %self.id, file = %upload.path.display(), %kind, "processing upload");

        let documents = load_kind(&upload.path, kind).await?;
        let chunker = config.splitter.build(config.chunk_size, config.chunk_overlap)?;
        let chunks = chunker.split_documents(&documents);
        let chunk_count = chunks.len();

        let index = VectorStoreBuilder::new(self.deps.embedder.clone())
            .batch_size(config.embed_batch_size)
            .build(chunks)
            .await?;
        let retriever = index.as_retriever(&config.search_type, config.search)?;
        let chain = ConversationalRetrievalChain::new(retriever, self.deps.model.clone())
            .with_options(config.chain);

        self.state = SessionState::Ready(Box::new(chain));
        info!(session_id = %self.id, chunk_count, "session ready");

        Ok(UploadReport {
            file_name: upload.name(),
            kind,
            document_count: documents.len(),
            chunk_count,
        })
    }

    /// Answer `question`, or return [`IDLE_MESSAGE`] if nothing is indexed.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::RetrievalFailed`] and
    /// [`RagError::GenerationFailed`] from the chain; memory is unchanged.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        match &mut self.state {
            SessionState::Idle => {
                warn!(session_id = %self.id, "question asked before upload");
                Ok(Answer::without_sources(IDLE_MESSAGE))
            }
            SessionState::Ready(chain) => chain.ask(question).await,
        }
    }

    /// Completed turns, oldest first. Empty while Idle.
    pub fn history(&self) -> Vec<Turn> {
        match &self.state {
            SessionState::Idle => Vec::new(),
            SessionState::Ready(chain) => chain.memory().turns().to_vec(),
        }
    }
}

/// Owns every live [`Session`].
///
/// Cloning is cheap and clones share the same sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    deps: SessionDeps,
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>>,
}

impl SessionManager {
    pub fn new(deps: SessionDeps) -> Self {
        Self { deps, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn deps(&self) -> &SessionDeps {
        &self.deps
    }

    /// Start an Idle session and return its id.
    pub async fn create_session(&self) -> SessionId {
        let session_id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new(session_id.clone(), self.deps.clone())));
        self.sessions.write().await.insert(session_id.clone(), session);
        info!(%session_id, "session created");
        session_id
    }

    async fn get(&self, session_id: &str) -> Result<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| RagError::SessionNotFound(session_id.to_string()))
    }

    /// See [`Session::upload_file`].
    pub async fn upload_file(&self, session_id: &str, upload: FileUpload) -> Result<UploadReport> {
        let session = self.get(session_id).await?;
        let mut session = session.lock().await;
        session.upload_file(&upload).await
    }

    /// See [`Session::ask`].
    pub async fn ask(&self, session_id: &str, question: &str) -> Result<Answer> {
        let session = self.get(session_id).await?;
        let mut session = session.lock().await;
        session.ask(question).await
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<Turn>> {
        let session = self.get(session_id).await?;
        let session = session.lock().await;
        Ok(session.history())
    }

    pub async fn is_ready(&self, session_id: &str) -> Result<bool> {
        let session = self.get(session_id).await?;
        let session = session.lock().await;
        Ok(session.is_ready())
    }

    /// Drop a session and everything it indexed.
    pub async fn end_session(&self, session_id: &str) -> Result<()> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| info!(%session_id, "session ended"))
            .ok_or_else(|| RagError::SessionNotFound(session_id.to_string()))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
