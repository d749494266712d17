//! Typed configuration sections.
//!
//! Every recognised option is a named field with a default. Sections are
//! validated as soon as they are extracted so a bad value fails at startup,
//! never on the first query.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

/// How first-stage candidates are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Strategy {
    /// Dense similarity only; fusion is a pass-through.
    Dense,
    /// Dense + sparse, merged with reciprocal rank fusion.
    Hybrid,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Dense => "dense",
            Strategy::Hybrid => "hybrid",
        }
    }

    pub fn is_hybrid(&self) -> bool { matches!(self, Strategy::Hybrid) }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dense" => Ok(Strategy::Dense),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(Error::config(format!("unknown retrieval strategy '{other}' (expected 'dense' or 'hybrid')"))),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> { s.parse().map_err(|e: Error| e.to_string()) }
}

impl From<Strategy> for String {
    fn from(s: Strategy) -> Self { s.as_str().to_string() }
}

/// Per-collaborator call limits, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub embed_ms: u64,
    pub search_ms: u64,
    pub rerank_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self { Self { embed_ms: 30_000, search_ms: 10_000, rerank_ms: 60_000 } }
}

impl TimeoutConfig {
    pub fn embed(&self) -> Duration { Duration::from_millis(self.embed_ms) }
    pub fn search(&self) -> Duration { Duration::from_millis(self.search_ms) }
    pub fn rerank(&self) -> Duration { Duration::from_millis(self.rerank_ms) }
}

/// Settings for the hybrid retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub strategy: Strategy,
    /// Candidates fetched per vector kind.
    pub top_k_retrieval: usize,
    /// Candidates returned after reranking.
    pub top_k_final: usize,
    /// RRF damping constant.
    pub rrf_k: u32,
    pub rerank_model_id: String,
    /// `false` bypasses the reranker entirely.
    pub rerank_enabled: bool,
    pub timeouts: TimeoutConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Hybrid,
            top_k_retrieval: 20,
            top_k_final: 5,
            rrf_k: 60,
            rerank_model_id: "BAAI/bge-reranker-v2-m3".to_string(),
            rerank_enabled: true,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl RetrievalConfig {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let section: Self = cfg.get_or_default("retrieval")?;
        section.validate()?;
        Ok(section)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k_retrieval == 0 {
            return Err(Error::config("retrieval.top_k_retrieval must be at least 1"));
        }
        if self.top_k_final == 0 {
            return Err(Error::config("retrieval.top_k_final must be at least 1"));
        }
        if self.rrf_k == 0 {
            return Err(Error::config("retrieval.rrf_k must be positive"));
        }
        if self.rerank_enabled && self.rerank_model_id.trim().is_empty() {
            return Err(Error::config("retrieval.rerank_model_id is required when reranking is enabled"));
        }
        let t = &self.timeouts;
        if t.embed_ms == 0 || t.search_ms == 0 || t.rerank_ms == 0 {
            return Err(Error::config("retrieval.timeouts must all be positive"));
        }
        if self.top_k_final > self.top_k_retrieval {
            tracing::warn!(
                top_k_final = self.top_k_final,
                top_k_retrieval = self.top_k_retrieval,
                "top_k_final exceeds top_k_retrieval; results are capped by the candidate count"
            );
        }
        Ok(())
    }
}

/// `embedding.sparse_model` value selecting the hashed sparse embedder.
pub const HASHED_SPARSE_MODEL: &str = "hashed";

/// Settings for embedding models and the cross-encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dense_model: String,
    /// Directory holding the dense model files; falls back to `APP_MODEL_DIR`.
    pub model_dir: Option<String>,
    /// Directory holding the cross-encoder files; falls back to `APP_RERANKER_DIR`.
    pub reranker_dir: Option<String>,
    /// SPLADE model for sparse vectors, or `hashed` for the model-free embedder.
    pub sparse_model: String,
    /// Directory holding the SPLADE files; falls back to `APP_SPARSE_MODEL_DIR`.
    pub sparse_model_dir: Option<String>,
    pub dense_dim: usize,
    /// Size of the hashed sparse vocabulary.
    pub sparse_dim: u32,
    pub max_len: usize,
    /// Token budget for each (query, text) pair fed to the cross-encoder.
    pub reranker_max_len: usize,
    /// Use the hashed embedders and lexical scorer instead of loading models.
    pub use_fake: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dense_model: "BAAI/bge-m3".to_string(),
            model_dir: None,
            reranker_dir: None,
            sparse_model: "prithivida/Splade_PP_En_v1".to_string(),
            sparse_model_dir: None,
            dense_dim: 1024,
            sparse_dim: 1 << 18,
            max_len: 256,
            reranker_max_len: 512,
            use_fake: false,
        }
    }
}

impl EmbeddingConfig {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let section: Self = cfg.get_or_default("embedding")?;
        section.validate()?;
        Ok(section)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dense_model.trim().is_empty() {
            return Err(Error::config("embedding.dense_model is required"));
        }
        if self.sparse_model.trim().is_empty() {
            return Err(Error::config("embedding.sparse_model is required (use \"hashed\" for the model-free embedder)"));
        }
        if self.dense_dim == 0 || self.sparse_dim == 0 || self.max_len == 0 {
            return Err(Error::config("embedding.dense_dim, sparse_dim and max_len must be positive"));
        }
        if self.reranker_max_len == 0 {
            return Err(Error::config("embedding.reranker_max_len must be positive"));
        }
        Ok(())
    }

    /// True when sparse vectors come from the hashed embedder rather than SPLADE.
    pub fn hashed_sparse(&self) -> bool {
        self.use_fake || self.sparse_model.trim().eq_ignore_ascii_case(HASHED_SPARSE_MODEL)
    }
}

/// Settings for the candidate store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// LanceDB directory, or `:memory:` for the in-process store.
    pub uri: String,
    pub table: String,
    pub dense_dim: usize,
}

impl Default for StoreConfig {
    fn default() -> Self { Self { uri: ":memory:".to_string(), table: "chunks".to_string(), dense_dim: 1024 } }
}

impl StoreConfig {
    pub const MEMORY_URI: &'static str = ":memory:";

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let section: Self = cfg.get_or_default("store")?;
        section.validate()?;
        Ok(section)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uri.trim().is_empty() {
            return Err(Error::config("store.uri is required"));
        }
        if self.table.trim().is_empty() {
            return Err(Error::config("store.table is required"));
        }
        if self.dense_dim == 0 {
            return Err(Error::config("store.dense_dim must be positive"));
        }
        Ok(())
    }

    pub fn is_memory(&self) -> bool { self.uri == Self::MEMORY_URI }
}

/// Which chat-completions service answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    /// OpenAI-compatible server at `generation.endpoint`, no API key.
    Local,
    /// api.openai.com with the key from `generation.api_key_env`.
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::OpenAi => "openai",
        }
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Provider::Local),
            "openai" => Ok(Provider::OpenAi),
            other => Err(Error::config(format!("unknown generation provider '{other}'"))),
        }
    }
}

impl TryFrom<String> for Provider {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> { s.parse().map_err(|e: Error| e.to_string()) }
}

impl From<Provider> for String {
    fn from(p: Provider) -> Self { p.as_str().to_string() }
}

/// Settings for answer generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key_env: String,
    pub timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Local,
            endpoint: "http://localhost:8080/v1".to_string(),
            model: "llama-3-8b".to_string(),
            temperature: 0.1,
            max_tokens: 512,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_ms: 120_000,
        }
    }
}

impl GenerationConfig {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let section: Self = cfg.get_or_default("generation")?;
        section.validate()?;
        Ok(section)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::config("generation.model is required"));
        }
        if self.provider == Provider::Local && self.endpoint.trim().is_empty() {
            return Err(Error::config("generation.endpoint is required for the local provider"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::config(format!("generation.temperature {} is outside 0..=2", self.temperature)));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config("generation.timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}

/// How documents are split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChunkStrategy {
    /// Word windows of `chunk_size` with `chunk_overlap` words shared.
    Fixed,
    /// Sentence groups split where neighbouring embeddings diverge.
    Semantic,
}

impl ChunkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::Fixed => "fixed",
            ChunkStrategy::Semantic => "semantic",
        }
    }
}

impl FromStr for ChunkStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(ChunkStrategy::Fixed),
            "semantic" => Ok(ChunkStrategy::Semantic),
            other => Err(Error::config(format!("unknown chunking strategy '{other}' (expected 'fixed' or 'semantic')"))),
        }
    }
}

impl TryFrom<String> for ChunkStrategy {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> { s.parse().map_err(|e: Error| e.to_string()) }
}

impl From<ChunkStrategy> for String {
    fn from(s: ChunkStrategy) -> Self { s.as_str().to_string() }
}

/// Settings for the chunkers. Sizes are in words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: ChunkStrategy,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Semantic only: distances above this percentile start a new chunk.
    pub breakpoint_percentile_threshold: f32,
    /// Semantic only: sentences on each side embedded together with a sentence.
    pub buffer_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Fixed,
            chunk_size: 512,
            chunk_overlap: 50,
            breakpoint_percentile_threshold: 95.0,
            buffer_size: 1,
        }
    }
}

impl ChunkingConfig {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let section: Self = cfg.get_or_default("chunking")?;
        section.validate()?;
        Ok(section)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config("chunking.chunk_overlap must be smaller than chunk_size"));
        }
        if !(0.0..=100.0).contains(&self.breakpoint_percentile_threshold) {
            return Err(Error::config(format!(
                "chunking.breakpoint_percentile_threshold {} is outside 0..=100",
                self.breakpoint_percentile_threshold
            )));
        }
        Ok(())
    }
}

/// All sections, extracted and validated together.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    pub generation: GenerationConfig,
    pub chunking: ChunkingConfig,
}

impl Settings {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            retrieval: RetrievalConfig::from_config(cfg)?,
            embedding: EmbeddingConfig::from_config(cfg)?,
            store: StoreConfig::from_config(cfg)?,
            generation: GenerationConfig::from_config(cfg)?,
            chunking: ChunkingConfig::from_config(cfg)?,
        })
    }
}
