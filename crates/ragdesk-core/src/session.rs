//! Session state: the documents uploaded so far and everything derived
//! from them.
//!
//! A [`Session`] owns the ordered document list, the current chunk
//! sequence, and the current index. Chunks and index are pure functions of
//! the document list and are rebuilt synchronously whenever a document is
//! accepted, so callers never observe stale state.
//!
//! Public operations never fail. Undecodable uploads are ignored, index
//! build failures fall back to the TF-IDF strategy, and search failures
//! are reported as "no results".
//!
//! Mutation takes `&mut self`; hosts that share a session between
//! requests wrap it in a mutex.
//!
//! # Example
//!
//! ```rust
//! use ragdesk_core::Session;
//!
//! let mut session = Session::default();
//! session.add_document(b"The cat sat on the mat.", "cats.txt");
//! assert_eq!(session.document_count(), 1);
//! assert!(session.ask("cat").contains("The cat sat on the mat."));
//! ```

use std::sync::Arc;
use tracing::{info, warn};

use crate::answer::{compose, ComposerParams};
use crate::chunk::{split_text, ChunkParams};
use crate::index::{self, IndexStrategy, TfIdfStrategy, VectorIndex};
use crate::loader::load_text;
use crate::models::{Document, Passage, SearchHit};

/// Returned by [`Session::ask`] before any document has been indexed.
pub const NOTHING_INDEXED_MESSAGE: &str =
    "There is nothing to search yet. Upload a document first.";

const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Tuning for a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionParams {
    pub chunk: ChunkParams,
    /// Passages retrieved per question.
    pub top_k: usize,
    pub composer: ComposerParams,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            chunk: ChunkParams::default(),
            top_k: 3,
            composer: ComposerParams::default(),
        }
    }
}

/// Documents, chunks and index for one user context.
pub struct Session {
    params: SessionParams,
    strategy: Arc<dyn IndexStrategy>,
    fallback: TfIdfStrategy,
    documents: Vec<Document>,
    chunks: Vec<String>,
    index: Option<Box<dyn VectorIndex>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionParams::default(), Arc::new(TfIdfStrategy::default()))
    }
}

impl Session {
    pub fn new(params: SessionParams, strategy: Arc<dyn IndexStrategy>) -> Self {
        Self {
            params,
            strategy,
            fallback: TfIdfStrategy::default(),
            documents: Vec::new(),
            chunks: Vec::new(),
            index: None,
        }
    }

    /// Decode `bytes` and, if any text remains after trimming, add it as a
    /// document and rebuild chunks and index.
    ///
    /// Returns whether the document was accepted.
    pub fn add_document(&mut self, bytes: &[u8], filename: &str) -> bool {
        let text = load_text(bytes, filename);
        if text.trim().is_empty() {
            warn!(filename, bytes = bytes.len(), "ignoring upload with no text");
            return false;
        }

        self.documents.push(Document::new(filename, text));
        self.rebuild();

        info!(
            filename,
            documents = self.documents.len(),
            chunks = self.chunks.len(),
            strategy = self.strategy.name(),
            "document added"
        );
        true
    }

    /// Answer `query` from the indexed documents.
    pub fn ask(&self, query: &str) -> String {
        self.ask_with_hits(query).0
    }

    /// Answer `query` and also return the hits the answer was composed from.
    ///
    /// The index is searched once.
    pub fn ask_with_hits(&self, query: &str) -> (String, Vec<SearchHit>) {
        if self.index.is_none() {
            return (NOTHING_INDEXED_MESSAGE.to_string(), Vec::new());
        }

        let hits = self.retrieve(query);
        let passages: Vec<Passage> = hits.iter().cloned().map(Passage::from).collect();
        (compose(query, &passages, &self.params.composer), hits)
    }

    /// Top-k hits for `query`, highest score first.
    pub fn retrieve(&self, query: &str) -> Vec<SearchHit> {
        match index::search(self.index.as_deref(), query, self.params.top_k) {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, strategy = self.strategy.name(), "search failed");
                Vec::new()
            }
        }
    }

    /// Drop all documents, chunks and the index.
    pub fn reset(&mut self) {
        self.documents.clear();
        self.chunks.clear();
        self.index = None;
        info!("session reset");
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Name of the configured index strategy.
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    fn rebuild(&mut self) {
        let merged = self
            .documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);

        self.chunks = split_text(&merged, &self.params.chunk);
        self.index = match self.strategy.build(&self.chunks) {
            Ok(index) => index,
            Err(e) => {
                warn!(
                    error = %e,
                    strategy = self.strategy.name(),
                    "index build failed, falling back to tfidf"
                );
                self.fallback.fit(&self.chunks).map(|i| Box::new(i) as Box<dyn VectorIndex>)
            }
        };
    }
}
