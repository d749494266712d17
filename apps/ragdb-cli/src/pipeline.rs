use std::sync::Arc;

use ragdb_core::chunking::{build_chunker, Chunker, Document};
use ragdb_core::settings::{Settings, Strategy};
use ragdb_core::traits::{CandidateStore, DenseEmbedder, SparseEmbedder};
use ragdb_core::types::{Chunk, ScoredCandidate};
use ragdb_core::{Error, Result};
use ragdb_hybrid::{HybridRetriever, Indexer};

/// A store, its embedders and a retriever built from one [`Settings`].
pub struct Pipeline {
    settings: Settings,
    store: Arc<dyn CandidateStore>,
    dense: Arc<dyn DenseEmbedder>,
    sparse: Arc<dyn SparseEmbedder>,
    retriever: HybridRetriever,
}

impl Pipeline {
    pub async fn build(settings: Settings) -> Result<Self> {
        if settings.store.dense_dim != settings.embedding.dense_dim {
            return Err(Error::config(format!(
                "store.dense_dim ({}) does not match embedding.dense_dim ({})",
                settings.store.dense_dim, settings.embedding.dense_dim
            )));
        }
        let store = ragdb_store::open_store(&settings.store).await?;
        let dense = ragdb_embed::dense_embedder(&settings.embedding)?;
        let sparse = ragdb_embed::sparse_embedder(&settings.embedding)?;

        let mut builder = HybridRetriever::builder(settings.retrieval.clone())
            .store(Arc::clone(&store))
            .dense_embedder(Arc::clone(&dense))
            .sparse_embedder(Arc::clone(&sparse));
        if settings.retrieval.rerank_enabled {
            builder = builder.scorer(ragdb_embed::relevance_scorer(&settings.embedding, &settings.retrieval.rerank_model_id)?);
        }
        let retriever = builder.build()?;
        Ok(Self { settings, store, dense, sparse, retriever })
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn store(&self) -> &Arc<dyn CandidateStore> { &self.store }

    /// The configured chunker; the semantic one shares this pipeline's dense embedder.
    pub fn chunker(&self) -> Result<Box<dyn Chunker>> {
        build_chunker(&self.settings.chunking, Some(Arc::clone(&self.dense)))
    }

    pub async fn ingest<P>(&self, chunks: &[Chunk], progress: P) -> Result<usize>
    where
        P: Fn(usize, usize),
    {
        // Sparse vectors are stored even for the dense strategy so switching needs no reindex.
        Indexer::new(Arc::clone(&self.store), Arc::clone(&self.dense))
            .with_sparse(Arc::clone(&self.sparse))
            .index_with_progress(chunks, progress)
            .await
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredCandidate>> { self.retriever.retrieve(query).await }
}

pub const DEMO_QUERY: &str = "What was the Net Income in 2023?";

pub fn demo_documents() -> Vec<Document> {
    vec![
        Document::new("doc1.pdf", "1", "Net Income for 2023 was $50 million."),
        Document::new("doc1.pdf", "2", "The company expanded into Asian markets in Q3."),
        Document::new("doc2.pdf", "1", "Competitor X reported a loss of $10 million."),
    ]
}

/// In-memory store, hashed embedders and the lexical scorer; no model files needed.
pub fn demo_settings(mut settings: Settings) -> Settings {
    settings.store.uri = ragdb_core::settings::StoreConfig::MEMORY_URI.to_string();
    settings.embedding.use_fake = true;
    settings.embedding.dense_dim = 256;
    settings.store.dense_dim = 256;
    settings.retrieval.strategy = Strategy::Hybrid;
    settings.retrieval.top_k_final = settings.retrieval.top_k_final.min(3);
    settings
}
