//! Index strategy selection and the local embedding backend.
//!
//! [`create_strategy`] turns the `[index]` config section into the
//! [`IndexStrategy`] a [`Session`](ragdesk_core::Session) builds with:
//!
//! | `index.strategy` | Strategy |
//! |------------------|----------|
//! | `"tfidf"` | [`TfIdfStrategy`] with the configured analyzer |
//! | `"dense"` | [`EmbeddedStrategy`] over a [`LocalEmbedder`] |
//!
//! The dense path runs models locally via fastembed (feature
//! `local-embeddings-fastembed`, on by default). Models are downloaded from
//! Hugging Face on first use and cached on disk; after that no network calls
//! are made. Loaded models are also cached in memory, once per model name
//! for the whole process, so every session shares them.

use anyhow::{bail, Result};
use ragdesk_core::index::embedded::Embedder;
use ragdesk_core::index::{EmbeddedStrategy, IndexStrategy, TfIdfStrategy};
use std::sync::Arc;
use tracing::debug;

use crate::config::{Config, IndexConfig};

/// Build the index strategy selected by `config.index`.
///
/// Creating the dense strategy does not load the model; that happens on
/// the first build.
pub fn create_strategy(config: &Config) -> Result<Arc<dyn IndexStrategy>> {
    match config.index.strategy.as_str() {
        "tfidf" => {
            let strategy = TfIdfStrategy::new(config.index.analyzer()?);
            debug!(analyzer = ?strategy.analyzer(), "using tf-idf index strategy");
            Ok(Arc::new(strategy))
        }
        "dense" => {
            let strategy = EmbeddedStrategy::new(Arc::new(LocalEmbedder::new(&config.index)?));
            debug!(
                model = strategy.embedder().model_name(),
                dims = strategy.embedder().dims(),
                "using dense index strategy"
            );
            Ok(Arc::new(strategy))
        }
        other => bail!("Unknown index strategy: {}", other),
    }
}

/// Dimensionality of the supported local models.
pub fn model_dims(model_name: &str) -> Option<usize> {
    match model_name {
        "all-minilm-l6-v2" => Some(384),
        "bge-small-en-v1.5" => Some(384),
        "bge-base-en-v1.5" => Some(768),
        "bge-large-en-v1.5" => Some(1024),
        "nomic-embed-text-v1" | "nomic-embed-text-v1.5" => Some(768),
        "multilingual-e5-small" => Some(384),
        "multilingual-e5-base" => Some(768),
        "multilingual-e5-large" => Some(1024),
        _ => None,
    }
}

/// Embedder that runs a sentence-embedding model in-process.
pub struct LocalEmbedder {
    model_name: String,
    dims: usize,
    batch_size: usize,
}

impl LocalEmbedder {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let Some(dims) = model_dims(&config.model) else {
            bail!(
                "Unknown local embedding model: '{}'. Supported models: \
                 all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, \
                 nomic-embed-text-v1, nomic-embed-text-v1.5, \
                 multilingual-e5-small, multilingual-e5-base, multilingual-e5-large",
                config.model
            );
        };
        Ok(Self {
            model_name: config.model.clone(),
            dims,
            batch_size: config.batch_size,
        })
    }
}

impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    #[cfg(feature = "local-embeddings-fastembed")]
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        fastembed_backend::embed(&self.model_name, texts, self.batch_size)
    }

    #[cfg(not(feature = "local-embeddings-fastembed"))]
    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!(
            "Dense index strategy requires ragdesk built with --features local-embeddings-fastembed (batch size {})",
            self.batch_size
        )
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
mod fastembed_backend {
    use anyhow::{anyhow, bail, Result};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, OnceLock};
    use tracing::info;

    type SharedModel = Arc<Mutex<TextEmbedding>>;

    static MODELS: OnceLock<Mutex<HashMap<String, SharedModel>>> = OnceLock::new();

    fn config_to_fastembed_model(name: &str) -> Result<EmbeddingModel> {
        match name {
            "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
            "bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
            "nomic-embed-text-v1" => Ok(EmbeddingModel::NomicEmbedTextV1),
            "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
            "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
            "multilingual-e5-base" => Ok(EmbeddingModel::MultilingualE5Base),
            "multilingual-e5-large" => Ok(EmbeddingModel::MultilingualE5Large),
            other => bail!("Unknown local embedding model: '{}'", other),
        }
    }

    /// Loaded model for `name`, initializing it on first request.
    ///
    /// The registry lock is held across initialization so concurrent first
    /// callers load the model once.
    fn shared_model(name: &str) -> Result<SharedModel> {
        let registry = MODELS.get_or_init(|| Mutex::new(HashMap::new()));
        let mut models = registry
            .lock()
            .map_err(|_| anyhow!("embedding model registry lock poisoned"))?;

        if let Some(model) = models.get(name) {
            return Ok(model.clone());
        }

        info!(model = name, "loading local embedding model");
        let model = TextEmbedding::try_new(
            InitOptions::new(config_to_fastembed_model(name)?).with_show_download_progress(true),
        )
        .map_err(|e| anyhow!("Failed to initialize local embedding model: {}", e))?;

        let model = Arc::new(Mutex::new(model));
        models.insert(name.to_string(), model.clone());
        Ok(model)
    }

    pub(super) fn embed(name: &str, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = shared_model(name)?;
        let mut model = model
            .lock()
            .map_err(|_| anyhow!("embedding model lock poisoned"))?;

        model
            .embed(texts.to_vec(), Some(batch_size))
            .map_err(|e| anyhow!("Local embedding failed: {}", e))
    }
}
