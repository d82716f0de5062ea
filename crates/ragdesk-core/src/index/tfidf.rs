//! Sparse TF-IDF index with cosine ranking.
//!
//! Fits a vocabulary and smoothed inverse document frequencies over the
//! chunk set, represents every chunk as an L2-normalized sparse vector of
//! `count × idf` weights, and scores queries by cosine similarity.
//!
//! ```text
//! idf(t)  = ln((1 + n) / (1 + df(t))) + 1
//! score   = q · c / ((‖q‖ + ε)(‖c‖ + ε))
//! ```
//!
//! Query terms missing from the vocabulary are ignored, so a query that
//! shares no terms with the corpus scores `0.0` against every chunk.

use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::{collect_hits, rank_top_k, IndexStrategy, VectorIndex};
use crate::models::SearchHit;

const NORM_EPSILON: f32 = 1e-10;

/// How text is broken into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerKind {
    /// Lowercased word tokens of two or more word characters.
    Word,
    /// Character n-grams taken inside space-padded word boundaries.
    CharWb,
}

/// Term extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Analyzer {
    pub kind: AnalyzerKind,
    /// Inclusive `(min, max)` n-gram lengths (words or characters).
    pub ngram_range: (usize, usize),
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::word()
    }
}

impl Analyzer {
    pub fn word() -> Self {
        Self {
            kind: AnalyzerKind::Word,
            ngram_range: (1, 1),
        }
    }

    pub fn char_wb() -> Self {
        Self {
            kind: AnalyzerKind::CharWb,
            ngram_range: (3, 5),
        }
    }

    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        self.ngram_range = (min.max(1), max.max(min.max(1)));
        self
    }

    /// Extract the terms of `text`, in order, with repeats.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        match self.kind {
            AnalyzerKind::Word => word_ngrams(&word_tokens(&lowered), self.ngram_range),
            AnalyzerKind::CharWb => char_wb_ngrams(&lowered, self.ngram_range),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn word_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !is_word_char(c))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

fn word_ngrams(tokens: &[String], (min_n, max_n): (usize, usize)) -> Vec<String> {
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n == 1 {
            terms.extend(tokens.iter().cloned());
        } else {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
    }
    terms
}

fn char_wb_ngrams(text: &str, (min_n, max_n): (usize, usize)) -> Vec<String> {
    let mut terms = Vec::new();
    for word in text.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for n in min_n..=max_n {
            if padded.len() <= n {
                // short words are counted once, whole
                terms.push(padded.iter().collect());
                break;
            }
            terms.extend(padded.windows(n).map(|w| w.iter().collect::<String>()));
        }
    }
    terms
}

/// Sparse vector as `(term id, weight)` pairs sorted by term id.
type SparseVec = Vec<(usize, f32)>;

fn l2_norm(v: &SparseVec) -> f32 {
    v.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
}

fn normalize(mut v: SparseVec) -> SparseVec {
    let norm = l2_norm(&v);
    if norm > 0.0 {
        for (_, w) in &mut v {
            *w /= norm;
        }
    }
    v
}

fn sparse_dot(a: &SparseVec, b: &SparseVec) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0f32;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

/// Builds [`TfIdfIndex`]es. The default strategy.
#[derive(Debug, Clone, Default)]
pub struct TfIdfStrategy {
    analyzer: Analyzer,
}

impl TfIdfStrategy {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Fit a concrete [`TfIdfIndex`] over `chunks`.
    pub fn fit(&self, chunks: &[String]) -> Option<TfIdfIndex> {
        if chunks.is_empty() {
            return None;
        }

        let counts: Vec<HashMap<String, u32>> = chunks
            .iter()
            .map(|c| term_counts(self.analyzer.analyze(c)))
            .collect();

        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for row in &counts {
            for term in row.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = chunks.len() as f32;
        let mut vocabulary = HashMap::with_capacity(df.len());
        let mut idf = Vec::with_capacity(df.len());
        for (id, (term, freq)) in df.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), id);
            idf.push(((1.0 + n) / (1.0 + freq as f32)).ln() + 1.0);
        }

        let rows: Vec<SparseVec> = counts
            .iter()
            .map(|row| weigh(row, &vocabulary, &idf))
            .collect();
        let norms = rows.iter().map(l2_norm).collect();

        let index = TfIdfIndex {
            analyzer: self.analyzer,
            chunks: chunks.to_vec(),
            vocabulary,
            idf,
            rows,
            norms,
        };
        debug!(
            chunks = chunks.len(),
            vocabulary = index.vocabulary_len(),
            "fitted tf-idf index"
        );
        Some(index)
    }
}

impl IndexStrategy for TfIdfStrategy {
    fn name(&self) -> &str {
        "tfidf"
    }

    fn build(&self, chunks: &[String]) -> Result<Option<Box<dyn VectorIndex>>> {
        Ok(self
            .fit(chunks)
            .map(|index| Box::new(index) as Box<dyn VectorIndex>))
    }
}

fn term_counts(terms: Vec<String>) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for t in terms {
        *counts.entry(t).or_insert(0) += 1;
    }
    counts
}

/// `count × idf` for in-vocabulary terms, L2-normalized.
fn weigh(counts: &HashMap<String, u32>, vocabulary: &HashMap<String, usize>, idf: &[f32]) -> SparseVec {
    let mut v: SparseVec = counts
        .iter()
        .filter_map(|(term, &count)| {
            vocabulary
                .get(term)
                .map(|&id| (id, count as f32 * idf[id]))
        })
        .collect();
    v.sort_by_key(|(id, _)| *id);
    normalize(v)
}

/// A fitted TF-IDF index.
#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    analyzer: Analyzer,
    chunks: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    rows: Vec<SparseVec>,
    norms: Vec<f32>,
}

impl TfIdfIndex {
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Cosine score of `query` against every chunk, in chunk order.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let q = weigh(
            &term_counts(self.analyzer.analyze(query)),
            &self.vocabulary,
            &self.idf,
        );
        let q_norm = l2_norm(&q);
        self.rows
            .iter()
            .zip(&self.norms)
            .map(|(row, &norm)| {
                sparse_dot(&q, row) / ((q_norm + NORM_EPSILON) * (norm + NORM_EPSILON))
            })
            .collect()
    }
}

impl VectorIndex for TfIdfIndex {
    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn chunk(&self, i: usize) -> Option<&str> {
        self.chunks.get(i).map(String::as_str)
    }

    fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let ranked = rank_top_k(&self.scores(query), k);
        Ok(collect_hits(self, ranked))
    }
}
