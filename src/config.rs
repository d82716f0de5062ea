//! Configuration parsing and validation.
//!
//! ragdesk is configured via a TOML file (default: `config/ragdesk.toml`).
//! Every section and key is optional; missing values take the defaults
//! shown below, which also make up [`Config::default`].
//!
//! ```toml
//! [chunking]
//! chunk_size = 500        # max characters per chunk
//! chunk_overlap = 100     # characters of trailing context carried forward
//!
//! [retrieval]
//! top_k = 3               # passages per answer
//! preview_chars = 400     # characters shown per passage
//!
//! [index]
//! strategy = "tfidf"      # "tfidf" or "dense"
//! analyzer = "word"       # tfidf only: "word" or "char_wb"
//! ngram_min = 1
//! ngram_max = 1
//! model = "all-minilm-l6-v2"  # dense only
//! batch_size = 64             # dense only
//!
//! [ingest]
//! include_globs = ["**/*.txt", "**/*.md"]
//! exclude_globs = []
//! follow_symlinks = false
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```

use anyhow::{bail, Context, Result};
use ragdesk_core::answer::ComposerParams;
use ragdesk_core::chunk::ChunkParams;
use ragdesk_core::index::tfidf::{Analyzer, AnalyzerKind};
use ragdesk_core::SessionParams;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_top_k() -> usize {
    3
}
fn default_preview_chars() -> usize {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_analyzer")]
    pub analyzer: String,
    #[serde(default = "default_ngram_min")]
    pub ngram_min: usize,
    /// Defaults to `ngram_min` for `word` and to 5 for `char_wb`.
    #[serde(default)]
    pub ngram_max: Option<usize>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            analyzer: default_analyzer(),
            ngram_min: default_ngram_min(),
            ngram_max: None,
            model: default_model(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_strategy() -> String {
    "tfidf".to_string()
}
fn default_analyzer() -> String {
    "word".to_string()
}
fn default_ngram_min() -> usize {
    1
}
fn default_model() -> String {
    "all-minilm-l6-v2".to_string()
}
fn default_batch_size() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl IndexConfig {
    pub fn is_dense(&self) -> bool {
        self.strategy == "dense"
    }

    /// The TF-IDF analyzer described by this section.
    pub fn analyzer(&self) -> Result<Analyzer> {
        let base = match self.analyzer.as_str() {
            "word" => Analyzer::word(),
            "char_wb" => Analyzer::char_wb(),
            other => bail!(
                "Unknown index.analyzer: '{}'. Must be word or char_wb.",
                other
            ),
        };
        let ngram_max = self.ngram_max.unwrap_or(match base.kind {
            AnalyzerKind::Word => self.ngram_min,
            AnalyzerKind::CharWb => base.ngram_range.1.max(self.ngram_min),
        });
        let ngram_min = match (base.kind, self.ngram_max) {
            (AnalyzerKind::CharWb, None) if self.ngram_min == default_ngram_min() => {
                base.ngram_range.0
            }
            _ => self.ngram_min,
        };
        Ok(base.with_ngram_range(ngram_min, ngram_max))
    }
}

impl Config {
    /// Session tuning derived from `[chunking]` and `[retrieval]`.
    pub fn session_params(&self) -> SessionParams {
        SessionParams {
            chunk: ChunkParams::new(self.chunking.chunk_size, self.chunking.chunk_overlap),
            top_k: self.retrieval.top_k,
            composer: ComposerParams {
                preview_chars: self.retrieval.preview_chars,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.session_params()
            .chunk
            .validate()
            .context("invalid [chunking] section")?;

        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }
        if self.retrieval.preview_chars < 1 {
            bail!("retrieval.preview_chars must be >= 1");
        }

        match self.index.strategy.as_str() {
            "tfidf" | "dense" => {}
            other => bail!(
                "Unknown index.strategy: '{}'. Must be tfidf or dense.",
                other
            ),
        }

        self.index.analyzer()?;
        let min = self.index.ngram_min;
        let max = self.index.ngram_max.unwrap_or(min);
        if min < 1 || min > max {
            bail!(
                "index ngram range must satisfy 1 <= ngram_min <= ngram_max (got {}..={})",
                min,
                max
            );
        }

        if self.index.is_dense() && self.index.batch_size == 0 {
            bail!("index.batch_size must be > 0 when strategy is 'dense'");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Like [`load_config`], but a missing file yields [`Config::default`].
///
/// Used for the CLI's default config path so ragdesk runs without any
/// setup; an explicitly passed path that does not exist is still an error.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    load_config(path)
}
