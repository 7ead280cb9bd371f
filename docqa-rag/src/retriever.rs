//! Query interface over a [`VectorIndex`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::builder::VectorIndex;
use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::mmr::mmr_select;

/// Retrieval strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Plain top-k by cosine similarity.
    #[default]
    Similarity,
    /// Maximal marginal relevance over a larger candidate set.
    Mmr,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::Mmr => "mmr",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "similarity" => Ok(Self::Similarity),
            "mmr" => Ok(Self::Mmr),
            _ => Err(RagError::UnknownSearchType(s.to_string())),
        }
    }
}

/// Tuning knobs for a [`Retriever`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Number of chunks returned per query.
    pub k: usize,
    /// Candidates fetched before MMR re-ranking. Ignored by similarity search.
    pub fetch_k: usize,
    /// MMR trade-off: 1.0 is pure relevance, 0.0 pure diversity.
    pub lambda_mult: f32,
    /// Drop similarity results scoring below this value.
    pub score_threshold: Option<f32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { k: 2, fetch_k: 20, lambda_mult: 0.5, score_threshold: None }
    }
}

impl SearchOptions {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_fetch_k(mut self, fetch_k: usize) -> Self {
        self.fetch_k = fetch_k;
        self
    }

    pub fn with_lambda_mult(mut self, lambda_mult: f32) -> Self {
        self.lambda_mult = lambda_mult;
        self
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Check the options are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `k == 0`, `fetch_k < k` or
    /// `lambda_mult` is outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(RagError::Configuration("k must be greater than zero".to_string()));
        }
        if self.fetch_k < self.k {
            return Err(RagError::Configuration(format!(
                "fetch_k ({}) must be at least k ({})",
                self.fetch_k, self.k
            )));
        }
        if !(0.0..=1.0).contains(&self.lambda_mult) {
            return Err(RagError::Configuration(format!(
                "lambda_mult ({}) must be between 0 and 1",
                self.lambda_mult
            )));
        }
        Ok(())
    }
}

/// A validated, stateless query view over a [`VectorIndex`].
///
/// The search type and options are checked when the retriever is created, so
/// a bad configuration never surfaces at query time.
///
/// ```rust,ignore
/// let retriever = index.as_retriever("mmr", SearchOptions::default().with_k(4))?;
/// let results = retriever.retrieve("what changed in 2023?").await?;
/// ```
#[derive(Clone)]
pub struct Retriever {
    index: VectorIndex,
    search_type: SearchType,
    options: SearchOptions,
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("search_type", &self.search_type)
            .field("options", &self.options)
            .field("chunks", &self.index.len())
            .finish()
    }
}

impl Retriever {
    /// Create a retriever from a search type name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnknownSearchType`] for names other than
    /// `similarity` and `mmr`, and [`RagError::Configuration`] for invalid
    /// options.
    pub fn new(index: VectorIndex, search_type: &str, options: SearchOptions) -> Result<Self> {
        Self::with_search_type(index, search_type.parse()?, options)
    }

    pub fn with_search_type(
        index: VectorIndex,
        search_type: SearchType,
        options: SearchOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self { index, search_type, options })
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Return the chunks most relevant to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalFailed`] if embedding the query or
    /// searching the store fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let embedding = self.index.embedder().embed(query).await.map_err(|e| {
            error!(error = %e, "failed to embed query");
            RagError::RetrievalFailed(e.to_string())
        })?;

        let results = match self.search_type {
            SearchType::Similarity => {
                let mut results = self
                    .index
                    .store()
                    .search(&embedding, self.options.k)
                    .await
                    .map_err(|e| RagError::RetrievalFailed(e.to_string()))?;
                if let Some(threshold) = self.options.score_threshold {
                    results.retain(|r| r.score >= threshold);
                }
                results
            }
            SearchType::Mmr => {
                let candidates = self
                    .index
                    .store()
                    .candidates(&embedding, self.options.fetch_k)
                    .await
                    .map_err(|e| RagError::RetrievalFailed(e.to_string()))?;
                mmr_select(&embedding, candidates, self.options.k, self.options.lambda_mult)
            }
        };

        debug!(
            search_type = %self.search_type,
            result_count = results.len(),
            "retrieved chunks"
        );
        Ok(results)
    }
}
