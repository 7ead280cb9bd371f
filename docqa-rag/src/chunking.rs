//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] — splits on paragraphs, then lines, sentences, words and
//!   finally single characters, merging pieces back up to the size limit with overlap
//! - [`FixedSizeChunker`] — fixed character windows with configurable overlap
//!
//! Sizes are measured in characters, not bytes. Every chunk records the character
//! offset it starts at (`start_index`), so the chunks of a document can always be
//! mapped back onto its text.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{
    CHUNK_INDEX_KEY, Chunk, Document, FILE_KEY, SOURCE_KEY, START_INDEX_KEY,
};
use crate::error::{RagError, Result};

/// Separators tried in order by [`RecursiveChunker`]. The empty separator
/// splits into single characters and always applies.
pub const DEFAULT_SEPARATORS: [&str; 7] = ["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a single document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text. The returned
    /// chunks carry `chunk_index` and `start_index` metadata but no `source`
    /// label; labels are assigned by [`split_documents`](Chunker::split_documents).
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Split a sequence of documents and label every chunk `source_{i}` in
    /// output order.
    fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = documents.iter().flat_map(|d| self.chunk(d)).collect();
        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.metadata.insert(SOURCE_KEY.to_string(), format!("source_{i}"));
        }
        debug!(document_count = documents.len(), chunk_count = chunks.len(), "split documents");
        chunks
    }
}

/// Which [`Chunker`] to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitterKind {
    /// [`RecursiveChunker`].
    #[default]
    Recursive,
    /// [`FixedSizeChunker`].
    Character,
}

impl SplitterKind {
    /// Build the chunker, validating the size parameters.
    pub fn build(self, chunk_size: usize, chunk_overlap: usize) -> Result<Arc<dyn Chunker>> {
        Ok(match self {
            SplitterKind::Recursive => Arc::new(RecursiveChunker::new(chunk_size, chunk_overlap)?),
            SplitterKind::Character => Arc::new(FixedSizeChunker::new(chunk_size, chunk_overlap)?),
        })
    }
}

impl fmt::Display for SplitterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitterKind::Recursive => f.write_str("recursive"),
            SplitterKind::Character => f.write_str("character"),
        }
    }
}

impl FromStr for SplitterKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recursive" | "recursivecharactertextsplitter" => Ok(SplitterKind::Recursive),
            "character" | "fixed" | "charactertextsplitter" => Ok(SplitterKind::Character),
            other => Err(RagError::Configuration(format!(
                "unknown splitter '{other}'; choose 'recursive' or 'character'"
            ))),
        }
    }
}

/// Reject parameters that would make splitting loop without progress.
pub fn validate_chunk_params(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::Configuration("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::Configuration(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// A byte range into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Convert span byte offsets into chunks, computing character offsets incrementally.
fn spans_to_chunks(document: &Document, spans: &[Span]) -> Vec<Chunk> {
    let text = &document.text;
    let mut base_metadata = document.metadata.clone();
    if let Some(path) = base_metadata.remove(SOURCE_KEY) {
        base_metadata.entry(FILE_KEY.to_string()).or_insert(path);
    }

    let mut last_byte = 0;
    let mut last_char = 0;
    spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            if span.start >= last_byte {
                last_char += char_len(&text[last_byte..span.start]);
            } else {
                last_char = char_len(&text[..span.start]);
            }
            last_byte = span.start;

            let mut metadata = base_metadata.clone();
            metadata.insert(CHUNK_INDEX_KEY.to_string(), i.to_string());
            metadata.insert(START_INDEX_KEY.to_string(), last_char.to_string());
            Chunk {
                id: format!("{}_{i}", document.id),
                text: text[span.start..span.end].to_string(),
                metadata,
                document_id: document.id.clone(),
            }
        })
        .collect()
}

/// Splits text into fixed-size character windows with configurable overlap.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 50)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunk_params(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let text = &document.text;
        let boundaries: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let total_chars = boundaries.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut spans = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(total_chars);
            spans.push(Span { start: boundaries[start], end: boundaries[end] });
            if end == total_chars {
                break;
            }
            start += step;
        }

        spans_to_chunks(document, &spans)
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// Text that already fits in `chunk_size` becomes a single chunk. Otherwise the
/// first separator present in the text splits it, keeping the separator on the
/// preceding piece. Pieces that fit are merged greedily into chunks of at most
/// `chunk_size` characters, and the trailing pieces of each chunk (up to
/// `chunk_overlap` characters) are repeated at the start of the next one.
/// Pieces that do not fit are split again with the remaining separators.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 300)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with [`DEFAULT_SEPARATORS`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunk_params(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the separator list. A character-level fallback is always kept last.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut separators: Vec<String> = separators.into_iter().map(Into::into).collect();
        if separators.last().is_none_or(|s| !s.is_empty()) {
            separators.push(String::new());
        }
        self.separators = separators;
        self
    }

    fn split_spans(&self, text: &str) -> Vec<Span> {
        let whole = Span { start: 0, end: text.len() };
        if char_len(text) <= self.chunk_size {
            return vec![whole];
        }
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        let mut out = Vec::new();
        self.split_recursive(text, whole, &separators, &mut out);
        out
    }

    fn split_recursive(&self, text: &str, span: Span, separators: &[&str], out: &mut Vec<Span>) {
        let slice = &text[span.start..span.end];
        let position = separators.iter().position(|s| s.is_empty() || slice.contains(*s));
        let (separator, remaining) = match position {
            Some(i) => (separators[i], &separators[i + 1..]),
            None => ("", &[][..]),
        };

        let mut pending = Vec::new();
        for piece in split_keeping_separator(text, span, separator) {
            if char_len(&text[piece.start..piece.end]) <= self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                self.merge(text, &pending, out);
                pending.clear();
            }
            self.split_recursive(text, piece, remaining, out);
        }
        if !pending.is_empty() {
            self.merge(text, &pending, out);
        }
    }

    /// Merge contiguous pieces into chunks of at most `chunk_size` characters.
    fn merge(&self, text: &str, pieces: &[Span], out: &mut Vec<Span>) {
        let mut window: VecDeque<(Span, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(&text[piece.start..piece.end]);
            if total + len > self.chunk_size && !window.is_empty() {
                out.push(window_span(&window));
                while let Some(&(_, front_len)) = window.front() {
                    let must_drop = total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0);
                    if !must_drop {
                        break;
                    }
                    window.pop_front();
                    total -= front_len;
                }
            }
            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            out.push(window_span(&window));
        }
    }
}

fn window_span(window: &VecDeque<(Span, usize)>) -> Span {
    let start = window.front().map(|(s, _)| s.start).unwrap_or_default();
    let end = window.back().map(|(s, _)| s.end).unwrap_or(start);
    Span { start, end }
}

/// Split a span at a separator, keeping the separator attached to the preceding
/// piece. The empty separator yields one piece per character.
fn split_keeping_separator(text: &str, span: Span, separator: &str) -> Vec<Span> {
    let slice = &text[span.start..span.end];
    if separator.is_empty() {
        return slice
            .char_indices()
            .map(|(i, c)| Span { start: span.start + i, end: span.start + i + c.len_utf8() })
            .collect();
    }

    let mut result = Vec::new();
    let mut start = 0;
    while let Some(pos) = slice[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(Span { start: span.start + start, end: span.start + end });
        start = end;
    }
    if start < slice.len() {
        result.push(Span { start: span.start + start, end: span.end });
    }
    result
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }
        let spans = self.split_spans(&document.text);
        spans_to_chunks(document, &spans)
    }
}
