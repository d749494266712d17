#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use ragdb_core::settings::{RetrievalConfig, Strategy};
use ragdb_core::traits::{CandidateStore, DenseEmbedder, RelevanceScorer, SparseEmbedder};
use ragdb_core::types::{Meta, MetaValue, Point, QueryVector, RankedList, ScoredCandidate, SparseVector, Stage};

pub fn cand(id: &str, score: f32, stage: Stage) -> ScoredCandidate {
    let mut metadata = Meta::new();
    metadata.insert("source".to_string(), MetaValue::from(format!("{id}.pdf")));
    ScoredCandidate::new(id, format!("text {id}"), metadata, score, stage)
}

pub fn ids(list: &[ScoredCandidate]) -> Vec<&str> { list.iter().map(|c| c.id.as_str()).collect() }

pub fn config(strategy: Strategy, rerank_enabled: bool) -> RetrievalConfig {
    RetrievalConfig { strategy, rerank_enabled, rerank_model_id: "mock-reranker".to_string(), ..Default::default() }
}

/// Scores a pair by looking its candidate text up; unknown texts score 0.
pub struct MapScorer {
    scores: HashMap<String, f32>,
    pub calls: AtomicUsize,
}

impl MapScorer {
    pub fn new(scores: &[(&str, f32)]) -> Self {
        let scores = scores.iter().map(|(id, s)| (format!("text {id}"), *s)).collect();
        Self { scores, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl RelevanceScorer for MapScorer {
    fn model_id(&self) -> &str { "mock-reranker" }

    fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(pairs.iter().map(|(_, text)| self.scores.get(text).copied().unwrap_or(0.0)).collect())
    }
}

pub struct FailingScorer;

impl RelevanceScorer for FailingScorer {
    fn model_id(&self) -> &str { "mock-reranker" }

    fn score(&self, _pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> { bail!("model not loaded") }
}

/// Returns one score fewer than asked for.
pub struct ShortScorer;

impl RelevanceScorer for ShortScorer {
    fn model_id(&self) -> &str { "mock-reranker" }

    fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> {
        Ok(vec![0.5; pairs.len().saturating_sub(1)])
    }
}

/// Blocks for `delay` before scoring every pair 1.0.
pub struct SlowScorer {
    pub delay: Duration,
}

impl RelevanceScorer for SlowScorer {
    fn model_id(&self) -> &str { "mock-reranker" }

    fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> {
        std::thread::sleep(self.delay);
        Ok(vec![1.0; pairs.len()])
    }
}

/// Serves canned dense and sparse lists regardless of the query vector.
#[derive(Default)]
pub struct FixedStore {
    pub dense: RankedList,
    pub sparse: RankedList,
    pub delay: Option<Duration>,
    pub fail: bool,
    pub searches: AtomicUsize,
}

impl FixedStore {
    pub fn new(dense: RankedList, sparse: RankedList) -> Self { Self { dense, sparse, ..Default::default() } }
}

#[async_trait]
impl CandidateStore for FixedStore {
    async fn upsert(&self, _points: Vec<Point>) -> anyhow::Result<()> { Ok(()) }

    async fn search(&self, query: &QueryVector, top_k: usize) -> anyhow::Result<RankedList> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            bail!("connection refused");
        }
        let list = match query {
            QueryVector::Dense(_) => &self.dense,
            QueryVector::Sparse(_) => &self.sparse,
        };
        Ok(list.iter().take(top_k).cloned().collect())
    }

    async fn count(&self) -> anyhow::Result<usize> { Ok(self.dense.len()) }
}

pub struct ConstDense {
    pub dim: usize,
    pub delay: Option<Duration>,
}

impl ConstDense {
    pub fn new(dim: usize) -> Self { Self { dim, delay: None } }
}

impl DenseEmbedder for ConstDense {
    fn dim(&self) -> usize { self.dim }

    fn embed_dense(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(texts.iter().map(|_| vec![1.0; self.dim]).collect())
    }
}

pub struct ConstSparse;

impl SparseEmbedder for ConstSparse {
    fn embed_sparse(&self, texts: &[String]) -> anyhow::Result<Vec<SparseVector>> {
        Ok(texts.iter().map(|_| SparseVector::from_pairs([(7, 1.0)])).collect())
    }
}
