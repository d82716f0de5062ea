//! Dense embedding index.
//!
//! Every chunk is embedded once at build time through an [`Embedder`];
//! queries are embedded on search and ranked by brute-force cosine
//! similarity. Concrete embedders (fastembed, ...) live in the application
//! crate.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

use super::{collect_hits, cosine_similarity, rank_top_k, IndexStrategy, VectorIndex};
use crate::models::SearchHit;

/// Trait for embedding backends.
///
/// Implementations must be cheap to share: the same embedder is used for
/// every rebuild and every query of a session.
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, returning one vector per input, in order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Builds [`EmbeddedIndex`]es using a shared [`Embedder`].
#[derive(Clone)]
pub struct EmbeddedStrategy {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddedStrategy {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }
}

impl IndexStrategy for EmbeddedStrategy {
    fn name(&self) -> &str {
        "dense"
    }

    fn build(&self, chunks: &[String]) -> Result<Option<Box<dyn VectorIndex>>> {
        if chunks.is_empty() {
            return Ok(None);
        }

        let vectors = self.embedder.embed(chunks)?;
        if vectors.len() != chunks.len() {
            bail!(
                "embedder '{}' returned {} vectors for {} chunks",
                self.embedder.model_name(),
                vectors.len(),
                chunks.len()
            );
        }

        debug!(
            chunks = chunks.len(),
            model = self.embedder.model_name(),
            dims = self.embedder.dims(),
            "embedded chunks"
        );

        let index = EmbeddedIndex {
            embedder: self.embedder.clone(),
            chunks: chunks.to_vec(),
            vectors,
        };
        Ok(Some(Box::new(index) as Box<dyn VectorIndex>))
    }
}

/// Chunks with their embedding vectors.
pub struct EmbeddedIndex {
    embedder: Arc<dyn Embedder>,
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex for EmbeddedIndex {
    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn chunk(&self, i: usize) -> Option<&str> {
        self.chunks.get(i).map(String::as_str)
    }

    fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))?;

        let scores: Vec<f32> = self
            .vectors
            .iter()
            .map(|v| cosine_similarity(&query_vec, v))
            .collect();

        Ok(collect_hits(self, rank_top_k(&scores, k)))
    }
}
