//! ragdb-embed
//!
//! Embedding providers (dense + sparse) and relevance scorers. Model-backed
//! implementations run on candle; hashed/lexical ones need no weights and are
//! selected with `APP_USE_FAKE_EMBEDDINGS=1` or `embedding.use_fake = true`.
//! `embedding.sparse_model = "hashed"` keeps the dense model but skips SPLADE.

pub mod cross_encoder;
pub mod dense;
pub mod device;
pub mod hashed;
pub mod lexical;
pub mod pool;
pub mod splade;
pub mod tokenize;
pub mod weights;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ragdb_core::config::expand_path;
use ragdb_core::settings::EmbeddingConfig;
use ragdb_core::traits::{DenseEmbedder, RelevanceScorer, SparseEmbedder};
use ragdb_core::{Error, Result};

pub use cross_encoder::CrossEncoderScorer;
pub use dense::BgeM3Embedder;
pub use hashed::{HashedDenseEmbedder, HashedSparseEmbedder};
pub use lexical::LexicalOverlapScorer;
pub use pool::masked_mean_l2;
pub use splade::SpladeEmbedder;

/// True when the config or `APP_USE_FAKE_EMBEDDINGS` asks for model-free providers.
pub fn use_fake_embeddings(config: &EmbeddingConfig) -> bool {
    config.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

pub fn dense_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn DenseEmbedder>> {
    if use_fake_embeddings(config) {
        tracing::info!(dim = config.dense_dim, "using hashed dense embedder");
        return Ok(Arc::new(HashedDenseEmbedder::new(config.dense_dim)));
    }
    let dir = resolve_model_dir(
        config.model_dir.as_deref(),
        &["APP_MODEL_DIR", "MODEL_DIR"],
        &["../models/bge-m3", "models/bge-m3"],
    )
    .ok_or_else(|| Error::config(format!("could not locate model directory for '{}'", config.dense_model)))?;
    let embedder = BgeM3Embedder::load(&dir, config.dense_dim, config.max_len)
        .map_err(|e| Error::config(format!("failed to load '{}': {e:#}", config.dense_model)))?;
    Ok(Arc::new(embedder))
}

pub fn sparse_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn SparseEmbedder>> {
    if config.hashed_sparse() || use_fake_embeddings(config) {
        tracing::info!(dim = config.sparse_dim, "using hashed sparse embedder");
        return Ok(Arc::new(HashedSparseEmbedder::new(config.sparse_dim)));
    }
    let dir = resolve_model_dir(
        config.sparse_model_dir.as_deref(),
        &["APP_SPARSE_MODEL_DIR"],
        &["../models/splade", "models/splade"],
    )
    .ok_or_else(|| Error::config(format!("could not locate model directory for '{}'", config.sparse_model)))?;
    let embedder = SpladeEmbedder::load(&dir, config.max_len)
        .map_err(|e| Error::config(format!("failed to load '{}': {e:#}", config.sparse_model)))?;
    Ok(Arc::new(embedder))
}

pub fn relevance_scorer(config: &EmbeddingConfig, model_id: &str) -> Result<Arc<dyn RelevanceScorer>> {
    if model_id.trim().is_empty() {
        return Err(Error::config("a reranker model id is required"));
    }
    if use_fake_embeddings(config) {
        tracing::info!("using lexical overlap scorer");
        return Ok(Arc::new(LexicalOverlapScorer::new()));
    }
    let dir = resolve_model_dir(
        config.reranker_dir.as_deref(),
        &["APP_RERANKER_DIR"],
        &["../models/bge-reranker", "models/bge-reranker"],
    )
    .ok_or_else(|| Error::config(format!("could not locate model directory for reranker '{model_id}'")))?;
    let scorer = CrossEncoderScorer::load(&dir, model_id, config.reranker_max_len)
        .map_err(|e| Error::config(format!("failed to load reranker '{model_id}': {e:#}")))?;
    Ok(Arc::new(scorer))
}

fn resolve_model_dir(configured: Option<&str>, env_keys: &[&str], fallbacks: &[&str]) -> Option<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Some(p); }
        tracing::warn!(dir = %p.display(), "configured model dir does not exist");
    }
    for key in env_keys {
        if let Ok(dir) = std::env::var(key) {
            let p = expand_path(&dir);
            if p.exists() {
                tracing::debug!(key = *key, dir = %p.display(), "model dir from env");
                return Some(p);
            }
        }
    }
    fallbacks.iter().map(Path::new).find(|p| p.exists()).map(Path::to_path_buf)
}
