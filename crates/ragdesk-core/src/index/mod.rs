//! Vector index abstraction and similarity search.
//!
//! An index is built from the complete chunk sequence and answers top-k
//! similarity queries over it. There is no incremental update: when the
//! chunk sequence changes, the caller builds a new index.
//!
//! Two strategies implement [`IndexStrategy`]:
//!
//! | Strategy | Module | Vectors |
//! |----------|--------|---------|
//! | [`TfIdfStrategy`] | [`tfidf`] | sparse TF-IDF term weights |
//! | [`EmbeddedStrategy`] | [`embedded`] | dense vectors from an [`Embedder`](embedded::Embedder) |
//!
//! Both rank by cosine similarity, so a higher score always means a closer
//! match regardless of strategy.

pub mod embedded;
pub mod tfidf;

use anyhow::Result;
use std::cmp::Ordering;

use crate::models::SearchHit;

pub use embedded::EmbeddedStrategy;
pub use tfidf::TfIdfStrategy;

/// Builds a [`VectorIndex`] from a chunk sequence.
pub trait IndexStrategy: Send + Sync {
    /// Short identifier used in logs and status output (e.g. `"tfidf"`).
    fn name(&self) -> &str;

    /// Build an index over `chunks`.
    ///
    /// Returns `Ok(None)` for an empty chunk sequence.
    fn build(&self, chunks: &[String]) -> Result<Option<Box<dyn VectorIndex>>>;
}

/// A built, immutable index over a chunk sequence.
pub trait VectorIndex: Send + Sync {
    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of the chunk at position `i`.
    fn chunk(&self, i: usize) -> Option<&str>;

    /// Return at most `k` hits, highest score first.
    ///
    /// Callers normally go through the free function [`search`], which
    /// handles empty queries and missing indexes.
    fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;
}

/// Search an optional index.
///
/// Returns an empty result without touching the index when there is no
/// index, `k` is zero, or the query is blank.
pub fn search(index: Option<&dyn VectorIndex>, query: &str, k: usize) -> Result<Vec<SearchHit>> {
    let Some(index) = index else {
        return Ok(Vec::new());
    };
    if k == 0 || query.trim().is_empty() {
        return Ok(Vec::new());
    }
    index.search(query, k)
}

/// Pick the `k` best `(position, score)` pairs, highest score first.
///
/// The sort is stable, so equal scores keep chunk order. NaN scores sort
/// last.
pub fn rank_top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal),
    });
    ranked.truncate(k);
    ranked
}

/// Turn ranked positions into [`SearchHit`]s using the index's chunk text.
pub(crate) fn collect_hits(
    index: &dyn VectorIndex,
    ranked: Vec<(usize, f32)>,
) -> Vec<SearchHit> {
    ranked
        .into_iter()
        .filter_map(|(i, score)| {
            index.chunk(i).map(|text| SearchHit {
                index: i,
                text: text.to_string(),
                score,
            })
        })
        .collect()
}

/// Compute cosine similarity between two dense vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or a
/// zero vector.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
