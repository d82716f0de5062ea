//! Core data types that flow through the retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Decoded text of one uploaded file.
///
/// Documents are immutable once created and live until the owning
/// session is reset.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Filename the bytes were uploaded under.
    pub filename: String,
    /// Decoded text content.
    pub content: String,
    /// When the document was accepted into the session.
    pub added_at: DateTime<Utc>,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            added_at: Utc::now(),
        }
    }

    /// Length of the content in characters.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// One ranked result from a vector index search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Position of the chunk in the sequence the index was built from.
    pub index: usize,
    /// Chunk text.
    pub text: String,
    /// Similarity score; higher is more similar.
    pub score: f32,
}

/// A piece of retrieved evidence handed to the answer composer.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub text: String,
    /// Similarity score, when the retriever produced one.
    pub score: Option<f32>,
}

impl Passage {
    pub fn new(text: impl Into<String>, score: Option<f32>) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

impl From<SearchHit> for Passage {
    fn from(hit: SearchHit) -> Self {
        Self {
            text: hit.text,
            score: Some(hit.score),
        }
    }
}
