//! The retrieval orchestrator: fetch, fuse, rerank, truncate.
//!
//! Every call into a collaborator is bounded by the matching timeout from
//! [`TimeoutConfig`](ragdb_core::settings::TimeoutConfig). Nothing is retried
//! here; failures surface to the caller of [`HybridRetriever::retrieve`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ragdb_core::settings::RetrievalConfig;
use ragdb_core::traits::{CandidateStore, DenseEmbedder, RelevanceScorer, SparseEmbedder};
use ragdb_core::types::{QueryVector, RankedList, ScoredCandidate};
use ragdb_core::{Collaborator, Error, Result};

use crate::fusion::{fuse, pass_through};
use crate::rerank::Reranker;

pub struct HybridRetriever {
    config: RetrievalConfig,
    store: Arc<dyn CandidateStore>,
    dense: Arc<dyn DenseEmbedder>,
    sparse: Option<Arc<dyn SparseEmbedder>>,
    reranker: Option<Reranker>,
}

/// Collects collaborators and checks them against the config in [`RetrieverBuilder::build`].
pub struct RetrieverBuilder {
    config: RetrievalConfig,
    store: Option<Arc<dyn CandidateStore>>,
    dense: Option<Arc<dyn DenseEmbedder>>,
    sparse: Option<Arc<dyn SparseEmbedder>>,
    scorer: Option<Arc<dyn RelevanceScorer>>,
}

impl RetrieverBuilder {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config, store: None, dense: None, sparse: None, scorer: None }
    }

    pub fn store(mut self, store: Arc<dyn CandidateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn dense_embedder(mut self, embedder: Arc<dyn DenseEmbedder>) -> Self {
        self.dense = Some(embedder);
        self
    }

    pub fn sparse_embedder(mut self, embedder: Arc<dyn SparseEmbedder>) -> Self {
        self.sparse = Some(embedder);
        self
    }

    pub fn scorer(mut self, scorer: Arc<dyn RelevanceScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Fails with [`Error::Configuration`] on invalid settings or a missing collaborator.
    pub fn build(self) -> Result<HybridRetriever> {
        let config = self.config;
        config.validate()?;
        let store = self.store.ok_or_else(|| Error::config("a candidate store is required"))?;
        let dense = self.dense.ok_or_else(|| Error::config("a dense embedder is required"))?;
        let sparse = if config.strategy.is_hybrid() {
            Some(self.sparse.ok_or_else(|| Error::config("the hybrid strategy requires a sparse embedder"))?)
        } else {
            None
        };
        let reranker = if config.rerank_enabled {
            let scorer = self
                .scorer
                .ok_or_else(|| Error::config(format!("reranker '{}' is enabled but no scorer was provided", config.rerank_model_id)))?;
            if scorer.model_id() != config.rerank_model_id {
                tracing::warn!(configured = %config.rerank_model_id, loaded = scorer.model_id(), "reranker model id differs from configuration");
            }
            Some(Reranker::new(scorer, config.timeouts.rerank()))
        } else {
            tracing::info!("reranking disabled; results keep fusion order");
            None
        };
        tracing::debug!(
            strategy = %config.strategy,
            top_k_retrieval = config.top_k_retrieval,
            top_k_final = config.top_k_final,
            rrf_k = config.rrf_k,
            "retriever ready"
        );
        Ok(HybridRetriever { config, store, dense, sparse, reranker })
    }
}

impl HybridRetriever {
    pub fn builder(config: RetrievalConfig) -> RetrieverBuilder { RetrieverBuilder::new(config) }

    pub fn config(&self) -> &RetrievalConfig { &self.config }

    /// Run one retrieval pass. Returns at most `top_k_final` candidates; an empty
    /// list means nothing matched.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredCandidate>> {
        let fused = match &self.sparse {
            Some(sparse) => {
                let (dense_hits, sparse_hits) = tokio::try_join!(self.dense_branch(query), self.sparse_branch(query, sparse))?;
                tracing::debug!(dense = dense_hits.len(), sparse = sparse_hits.len(), "candidates fetched");
                fuse(dense_hits, sparse_hits, self.config.rrf_k)
            }
            None => {
                let dense_hits = self.dense_branch(query).await?;
                tracing::debug!(dense = dense_hits.len(), "candidates fetched");
                pass_through(dense_hits)
            }
        };

        let mut ranked = match &self.reranker {
            Some(reranker) => reranker.rerank(query, fused).await?,
            None => fused,
        };
        ranked.truncate(self.config.top_k_final);
        tracing::info!(results = ranked.len(), strategy = %self.config.strategy, "retrieval complete");
        Ok(ranked)
    }

    async fn dense_branch(&self, query: &str) -> Result<RankedList> {
        let embedder = Arc::clone(&self.dense);
        let texts = vec![query.to_string()];
        let vectors = bounded(
            Collaborator::DenseEmbedder,
            self.config.timeouts.embed(),
            blocking(move || embedder.embed_dense(&texts)),
        )
        .await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream(Collaborator::DenseEmbedder, "no vector returned for the query"))?;
        if vector.len() != self.dense.dim() {
            return Err(Error::upstream(
                Collaborator::DenseEmbedder,
                format!("query vector has {} dims, expected {}", vector.len(), self.dense.dim()),
            ));
        }
        self.search(QueryVector::Dense(vector)).await
    }

    async fn sparse_branch(&self, query: &str, embedder: &Arc<dyn SparseEmbedder>) -> Result<RankedList> {
        let embedder = Arc::clone(embedder);
        let texts = vec![query.to_string()];
        let vectors = bounded(
            Collaborator::SparseEmbedder,
            self.config.timeouts.embed(),
            blocking(move || embedder.embed_sparse(&texts)),
        )
        .await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream(Collaborator::SparseEmbedder, "no vector returned for the query"))?;
        // A query with no indexed terms matches nothing.
        if vector.is_empty() {
            return Ok(Vec::new());
        }
        self.search(QueryVector::Sparse(vector)).await
    }

    async fn search(&self, query: QueryVector) -> Result<RankedList> {
        let kind = query.kind();
        let hits = bounded(
            Collaborator::CandidateStore,
            self.config.timeouts.search(),
            self.store.search(&query, self.config.top_k_retrieval),
        )
        .await?;
        tracing::trace!(kind = %kind, hits = hits.len(), "store search");
        Ok(hits)
    }
}

/// Await `fut` for at most `limit`, mapping failure and timeout to `UpstreamUnavailable`.
pub(crate) async fn bounded<T, F>(collaborator: Collaborator, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(%collaborator, error = %e, "collaborator call failed");
            Err(Error::upstream(collaborator, e))
        }
        Err(_) => {
            tracing::warn!(%collaborator, timeout_ms = limit.as_millis() as u64, "collaborator call timed out");
            Err(Error::upstream(collaborator, format!("timed out after {} ms", limit.as_millis())))
        }
    }
}

/// Run CPU-bound model inference off the async workers.
pub(crate) async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
