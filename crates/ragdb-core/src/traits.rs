use async_trait::async_trait;

use crate::types::{Point, QueryVector, RankedList, SparseVector};

/// Maps a batch of texts to fixed-length dense vectors, deterministically.
pub trait DenseEmbedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_dense(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Maps a batch of texts to term-weight vectors, deterministically.
pub trait SparseEmbedder: Send + Sync {
    fn embed_sparse(&self, texts: &[String]) -> anyhow::Result<Vec<SparseVector>>;
}

/// Cross-encoder style relevance model over (query, text) pairs.
///
/// Returns one score per pair, in input order. Higher is more relevant.
pub trait RelevanceScorer: Send + Sync {
    fn model_id(&self) -> &str;
    fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>>;
}

/// Point store queried by named vector kind.
///
/// `search` returns at most `top_k` candidates sorted best-first, tagged with
/// the stage matching the query's vector kind.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn upsert(&self, points: Vec<Point>) -> anyhow::Result<()>;
    async fn search(&self, query: &QueryVector, top_k: usize) -> anyhow::Result<RankedList>;
    async fn count(&self) -> anyhow::Result<usize>;
}

/// Text-in/text-out language model.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> anyhow::Result<String>;
}
