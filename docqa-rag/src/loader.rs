//! File loading by declared MIME type.
//!
//! [`FileKind`] is resolved eagerly from the MIME string; only plain text and
//! PDF are accepted. Plain text becomes one [`Document`]; a PDF becomes one
//! [`Document`] per page with zero-based `page` metadata.

use std::fmt;
use std::path::Path;

use tracing::{debug, error, info};

use crate::document::{Document, PAGE_KEY, SOURCE_KEY};
use crate::error::{RagError, Result};

/// MIME type for plain text uploads.
pub const TEXT_PLAIN: &str = "text/plain";
/// MIME type for PDF uploads.
pub const APPLICATION_PDF: &str = "application/pdf";

/// The loading strategy for an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Pdf,
}

impl FileKind {
    /// Resolve a MIME type. Parameters such as `; charset=utf-8` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFileType`] naming the offending type.
    pub fn from_mime(mime: &str) -> Result<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            TEXT_PLAIN => Ok(FileKind::PlainText),
            APPLICATION_PDF => Ok(FileKind::Pdf),
            _ => Err(RagError::UnsupportedFileType(mime.to_string())),
        }
    }

    /// Guess the kind from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "txt" | "text" | "md" | "log" => Ok(FileKind::PlainText),
            "pdf" => Ok(FileKind::Pdf),
            _ => Err(RagError::UnsupportedFileType(format!(
                "unrecognized extension for {}",
                path.display()
            ))),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::PlainText => TEXT_PLAIN,
            FileKind::Pdf => APPLICATION_PDF,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Load a file, dispatching on its declared MIME type.
///
/// # Errors
///
/// - [`RagError::UnsupportedFileType`] before touching the filesystem if the
///   MIME type is not accepted
/// - [`RagError::LoadFailed`] if the file cannot be read or parsed
pub async fn load_file(path: impl AsRef<Path>, mime: &str) -> Result<Vec<Document>> {
    let kind = FileKind::from_mime(mime)?;
    load_kind(path.as_ref(), kind).await
}

/// Load a file with an already resolved [`FileKind`].
pub async fn load_kind(path: &Path, kind: FileKind) -> Result<Vec<Document>> {
    let documents = match kind {
        FileKind::PlainText => load_text(path).await?,
        FileKind::Pdf => load_pdf(path).await?,
    };
    info!(path = %path.display(), kind = %kind, document_count = documents.len(), "loaded file");
    Ok(documents)
}

fn load_failed(path: &Path, message: impl Into<String>) -> RagError {
    let message = message.into();
    error!(path = %path.display(), error = %message, "failed to load file");
    RagError::LoadFailed { path: path.display().to_string(), message }
}

fn document_id(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("document").to_string()
}

async fn load_text(path: &Path) -> Result<Vec<Document>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| load_failed(path, e.to_string()))?;
    let document = Document::new(document_id(path), text)
        .with_metadata(SOURCE_KEY, path.display().to_string());
    Ok(vec![document])
}

async fn load_pdf(path: &Path) -> Result<Vec<Document>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| load_failed(path, e.to_string()))?;
    let source = path.display().to_string();
    let id = document_id(path);

    let pages =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .await
            .map_err(|e| load_failed(path, format!("pdf parsing task failed: {e}")))?
            .map_err(|e| load_failed(path, format!("invalid pdf: {e:?}")))?;

    debug!(path = %source, page_count = pages.len(), "extracted pdf pages");
    Ok(pages_to_documents(&id, &source, pages))
}

/// Build one [`Document`] per page, numbering pages from zero.
pub fn pages_to_documents(id: &str, source: &str, pages: Vec<String>) -> Vec<Document> {
    pages
        .into_iter()
        .enumerate()
        .map(|(page, text)| {
            Document::new(format!("{id}_p{page}"), text)
                .with_metadata(SOURCE_KEY, source)
                .with_metadata(PAGE_KEY, page.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_mapping_is_explicit() {
        assert_eq!(FileKind::from_mime("text/plain").unwrap(), FileKind::PlainText);
        assert_eq!(FileKind::from_mime("text/plain; charset=utf-8").unwrap(), FileKind::PlainText);
        assert_eq!(FileKind::from_mime("Application/PDF").unwrap(), FileKind::Pdf);
    }

    #[test]
    fn unsupported_mime_names_the_type() {
        let err = FileKind::from_mime("image/png").unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFileType(ref t) if t == "image/png"));
    }

    #[test]
    fn extension_guessing() {
        assert_eq!(FileKind::from_path("notes/readme.TXT").unwrap(), FileKind::PlainText);
        assert_eq!(FileKind::from_path("report.pdf").unwrap(), FileKind::Pdf);
        assert!(FileKind::from_path("sheet.xlsx").is_err());
    }

    #[test]
    fn pages_are_numbered_from_zero() {
        let docs = pages_to_documents("report", "/tmp/report.pdf", vec!["a".into(), "b".into()]);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].page(), Some(0));
        assert_eq!(docs[1].id, "report_p1");
        assert_eq!(docs[1].metadata.get(SOURCE_KEY).map(String::as_str), Some("/tmp/report.pdf"));
    }

    #[tokio::test]
    async fn loads_plain_text_as_single_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello\n\nworld").unwrap();

        let docs = load_file(&path, TEXT_PLAIN).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "hello\n\nworld");
        assert_eq!(docs[0].id, "notes");
    }

    #[tokio::test]
    async fn missing_file_is_load_failed() {
        let err = load_file("/definitely/not/here.txt", TEXT_PLAIN).await.unwrap_err();
        assert!(matches!(err, RagError::LoadFailed { .. }));
    }

    #[tokio::test]
    async fn unsupported_type_fails_before_reading() {
        let err = load_file("/definitely/not/here.png", "image/png").await.unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFileType(_)));
    }
}
