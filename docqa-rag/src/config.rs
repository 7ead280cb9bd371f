//! Configuration for indexing and answering.

use serde::{Deserialize, Serialize};

use crate::builder::DEFAULT_BATCH_SIZE;
use crate::chain::ChainOptions;
use crate::chunking::{SplitterKind, validate_chunk_params};
use crate::error::Result;
use crate::retriever::{SearchOptions, SearchType};

/// Everything a session needs to turn an upload into a ready chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    pub splitter: SplitterKind,
    /// `similarity` or `mmr`. Kept as text so an unknown name is reported by
    /// the retriever factory.
    pub search_type: String,
    pub search: SearchOptions,
    pub chain: ChainOptions,
    /// Chunks embedded per request while building the store.
    pub embed_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 300,
            splitter: SplitterKind::default(),
            search_type: SearchType::default().to_string(),
            search: SearchOptions::default(),
            chain: ChainOptions::default(),
            embed_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check every parameter, in the order they are used.
    ///
    /// # Errors
    ///
    /// - [`RagError::Configuration`](crate::RagError::Configuration) for bad
    ///   chunk or search parameters
    /// - [`RagError::UnknownSearchType`](crate::RagError::UnknownSearchType)
    ///   if `search_type` is not recognised
    pub fn validate(&self) -> Result<()> {
        validate_chunk_params(self.chunk_size, self.chunk_overlap)?;
        self.search_type.parse::<SearchType>()?;
        self.search.validate()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn splitter(mut self, splitter: SplitterKind) -> Self {
        self.config.splitter = splitter;
        self
    }

    pub fn search_type(mut self, search_type: impl Into<String>) -> Self {
        self.config.search_type = search_type.into();
        self
    }

    pub fn search(mut self, options: SearchOptions) -> Self {
        self.config.search = options;
        self
    }

    /// Set the number of chunks returned per question.
    pub fn k(mut self, k: usize) -> Self {
        self.config.search.k = k;
        self
    }

    pub fn chain(mut self, options: ChainOptions) -> Self {
        self.config.chain = options;
        self
    }

    pub fn embed_batch_size(mut self, batch_size: usize) -> Self {
        self.config.embed_batch_size = batch_size;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;

    #[test]
    fn defaults_match_upload_settings() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 300);
        assert_eq!(config.search_type, "similarity");
        assert_eq!(config.search.k, 2);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
    }

    #[test]
    fn unknown_search_type_is_rejected() {
        let err = RagConfig::builder().search_type("fuzzy").build().unwrap_err();
        assert!(matches!(err, RagError::UnknownSearchType(name) if name == "fuzzy"));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: RagConfig =
            serde_json::from_str(r#"{"chunk_size": 500, "search_type": "mmr"}"#).unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 300);
        assert_eq!(config.splitter, SplitterKind::Recursive);
        assert!(config.validate().is_ok());
    }
}
