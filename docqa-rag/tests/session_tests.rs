//! Session lifecycle: idle, upload, ask, failure handling.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_model::MockChatModel;
use docqa_rag::{
    EmbeddingProvider, FileUpload, HashEmbeddingProvider, IDLE_MESSAGE, RagConfig, RagError,
    Result, SessionDeps, SessionManager,
};

/// Embedder that always fails the way a rate-limited hosted API does.
struct QuotaExceededEmbedder;

#[async_trait]
impl EmbeddingProvider for QuotaExceededEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding {
            provider: "test".to_string(),
            message: "429 Too Many Requests: quota exceeded".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "quota"
    }
}

/// Hash embedder that counts how many texts it was asked to embed.
#[derive(Default)]
struct CountingEmbedder {
    inner: HashEmbeddingProvider,
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn manager_with(model: Arc<MockChatModel>) -> SessionManager {
    SessionManager::new(SessionDeps::new(Arc::new(HashEmbeddingProvider::default()), model))
}

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A minimal PDF with one line of Helvetica text per page.
fn two_page_pdf(pages: [&str; 2]) -> Vec<u8> {
    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R 5 0 R] /Count 2 >>".to_string(),
    ];
    for (i, text) in pages.iter().enumerate() {
        let content_id = 4 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 7 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        let stream = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        objects.push(format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()));
    }
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }
    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.into_bytes()
}

#[tokio::test]
async fn idle_session_never_calls_the_model() {
    let model = Arc::new(MockChatModel::new());
    let manager = manager_with(model.clone());
    let id = manager.create_session().await;

    let answer = manager.ask(&id, "What is in the file?").await.unwrap();
    assert_eq!(answer.answer, IDLE_MESSAGE);
    assert!(answer.sources.is_empty());
    assert_eq!(model.call_count(), 0);
    assert!(!manager.is_ready(&id).await.unwrap());
}

#[tokio::test]
async fn uploading_text_makes_session_ready() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "notes.txt",
        b"The launch window opens in March.\n\nThe crew has four members.",
    );
    let model = Arc::new(MockChatModel::new().with_reply("March."));
    let manager = manager_with(model.clone());
    let id = manager.create_session().await;

    let report = manager.upload_file(&id, FileUpload::new(&path, "text/plain")).await.unwrap();
    assert_eq!(report.file_name, "notes.txt");
    assert_eq!(report.document_count, 1);
    assert_eq!(report.chunk_count, 1);
    assert!(manager.is_ready(&id).await.unwrap());

    let answer = manager.ask(&id, "When does the launch window open?").await.unwrap();
    assert_eq!(answer.answer, "March.");
    assert_eq!(answer.sources[0].label, "source_0");
    assert_eq!(manager.history(&id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn two_page_pdf_answers_from_first_page() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = two_page_pdf([
        "Apollo eleven landed on the Moon in July 1969",
        "Voyager probes explored the outer planets",
    ]);
    let path = write_file(dir.path(), "missions.pdf", &pdf);

    let model = Arc::new(MockChatModel::new().with_reply("Apollo eleven landed on the Moon."));
    let manager = manager_with(model.clone());
    let id = manager.create_session().await;

    let report = manager.upload_file(&id, FileUpload::new(&path, "application/pdf")).await.unwrap();
    assert_eq!(report.document_count, 2);

    let answer = manager.ask(&id, "summarize page 1 about Apollo and the Moon").await.unwrap();
    assert!(!answer.answer.is_empty());
    assert!(
        answer.sources.iter().any(|s| s.page == Some(0) && s.excerpt.contains("Apollo")),
        "expected a page 1 excerpt, got {:?}",
        answer.sources
    );
    assert!(answer.sources.iter().all(|s| s.label.starts_with("source_")));
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn quota_error_during_build_leaves_session_idle() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "notes.txt", b"Some content worth indexing.");
    let model = Arc::new(MockChatModel::new());
    let manager = SessionManager::new(SessionDeps::new(Arc::new(QuotaExceededEmbedder), model.clone()));
    let id = manager.create_session().await;

    let err = manager.upload_file(&id, FileUpload::new(&path, "text/plain")).await.unwrap_err();
    assert!(matches!(err, RagError::BuildFailed(ref m) if m.contains("quota exceeded")));
    assert!(!manager.is_ready(&id).await.unwrap());

    let answer = manager.ask(&id, "anything?").await.unwrap();
    assert_eq!(answer.answer, IDLE_MESSAGE);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn unsupported_type_is_rejected_before_reading() {
    let manager = manager_with(Arc::new(MockChatModel::new()));
    let id = manager.create_session().await;

    let upload = FileUpload::new("/nonexistent/slides.pptx", "application/vnd.ms-powerpoint");
    let err = manager.upload_file(&id, upload).await.unwrap_err();
    assert!(matches!(err, RagError::UnsupportedFileType(_)));
    assert!(!manager.is_ready(&id).await.unwrap());
}

#[test]
fn with_config_rejects_unknown_search_type() {
    let config = RagConfig { search_type: "hybrid".to_string(), ..RagConfig::default() };
    let err = SessionDeps::new(
        Arc::new(HashEmbeddingProvider::default()),
        Arc::new(MockChatModel::new()),
    )
    .with_config(config)
    .unwrap_err();
    assert!(matches!(err, RagError::UnknownSearchType(ref t) if t == "hybrid"));
}

#[tokio::test]
async fn unknown_search_type_in_config_leaves_session_idle() {
    let dir = tempfile::tempdir().unwrap();
    let text = "Paragraph about probes and planets.\n\n".repeat(300);
    let path = write_file(dir.path(), "notes.txt", text.as_bytes());

    // Assigned directly so `with_config` does not catch it first.
    let embedder = Arc::new(CountingEmbedder::default());
    let mut deps = SessionDeps::new(embedder.clone(), Arc::new(MockChatModel::new()));
    deps.config.search_type = "hybrid".to_string();
    let manager = SessionManager::new(deps);
    let id = manager.create_session().await;

    let err = manager.upload_file(&id, FileUpload::new(&path, "text/plain")).await.unwrap_err();
    assert!(matches!(err, RagError::UnknownSearchType(_)));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(!manager.is_ready(&id).await.unwrap());
}

#[tokio::test]
async fn invalid_chunk_settings_fail_before_loading() {
    let embedder = Arc::new(CountingEmbedder::default());
    let mut deps = SessionDeps::new(embedder.clone(), Arc::new(MockChatModel::new()));
    deps.config.chunk_overlap = deps.config.chunk_size + 1;
    let manager = SessionManager::new(deps);
    let id = manager.create_session().await;

    // The file does not exist; a load attempt would report LoadFailed instead.
    let upload = FileUpload::new("/nonexistent/notes.txt", "text/plain");
    let err = manager.upload_file(&id, upload).await.unwrap_err();
    assert!(matches!(err, RagError::Configuration(_)));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "a.txt", b"first document");
    let manager = manager_with(Arc::new(MockChatModel::new()));
    let id = manager.create_session().await;

    manager.upload_file(&id, FileUpload::new(&path, "text/plain")).await.unwrap();
    let err = manager.upload_file(&id, FileUpload::new(&path, "text/plain")).await.unwrap_err();
    assert!(matches!(err, RagError::AlreadyIndexed(_)));
}

#[tokio::test]
async fn unknown_session_ids_are_reported() {
    let manager = manager_with(Arc::new(MockChatModel::new()));
    assert!(matches!(manager.ask("missing", "hi").await, Err(RagError::SessionNotFound(_))));
    assert!(matches!(manager.end_session("missing").await, Err(RagError::SessionNotFound(_))));
}

#[tokio::test]
async fn ended_session_is_gone() {
    let manager = manager_with(Arc::new(MockChatModel::new()));
    let id = manager.create_session().await;
    assert_eq!(manager.session_count().await, 1);

    manager.end_session(&id).await.unwrap();
    assert_eq!(manager.session_count().await, 0);
    assert!(matches!(manager.history(&id).await, Err(RagError::SessionNotFound(_))));
}

#[tokio::test]
async fn sessions_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "a.txt", b"isolated content");
    let manager = manager_with(Arc::new(MockChatModel::new()));
    let first = manager.create_session().await;
    let second = manager.create_session().await;

    manager.upload_file(&first, FileUpload::new(&path, "text/plain")).await.unwrap();
    manager.ask(&first, "question").await.unwrap();

    assert!(!manager.is_ready(&second).await.unwrap());
    assert!(manager.history(&second).await.unwrap().is_empty());
    assert_eq!(manager.history(&first).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_questions_on_one_session_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "a.txt", b"queued questions share one memory");
    let manager = manager_with(Arc::new(MockChatModel::new()));
    let id = manager.create_session().await;
    manager.upload_file(&id, FileUpload::new(&path, "text/plain")).await.unwrap();

    let asks = (0..5).map(|i| {
        let manager = manager.clone();
        let id = id.clone();
        tokio::spawn(async move { manager.ask(&id, &format!("question {i}")).await })
    });
    for handle in asks.collect::<Vec<_>>() {
        handle.await.unwrap().unwrap();
    }

    let history = manager.history(&id).await.unwrap();
    assert_eq!(history.len(), 5);
    let mut questions: Vec<&str> = history.iter().map(|t| t.question.as_str()).collect();
    questions.sort_unstable();
    questions.dedup();
    assert_eq!(questions.len(), 5);
}
