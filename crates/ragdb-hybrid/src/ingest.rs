//! Batch embedding and upsert of chunks into the candidate store.

use std::sync::Arc;

use ragdb_core::traits::{CandidateStore, DenseEmbedder, SparseEmbedder};
use ragdb_core::types::{Chunk, Point, SparseVector};
use ragdb_core::{Collaborator, Error, Result};

use crate::retriever::blocking;

const DEFAULT_BATCH_SIZE: usize = 32;

/// Embeds chunks and writes them to the candidate store as points.
pub struct Indexer {
    store: Arc<dyn CandidateStore>,
    dense: Arc<dyn DenseEmbedder>,
    sparse: Option<Arc<dyn SparseEmbedder>>,
    batch_size: usize,
}

impl Indexer {
    pub fn new(store: Arc<dyn CandidateStore>, dense: Arc<dyn DenseEmbedder>) -> Self {
        Self { store, dense, sparse: None, batch_size: DEFAULT_BATCH_SIZE }
    }

    pub fn with_sparse(mut self, sparse: Arc<dyn SparseEmbedder>) -> Self {
        self.sparse = Some(sparse);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn index(&self, chunks: &[Chunk]) -> Result<usize> { self.index_with_progress(chunks, |_, _| {}).await }

    /// Index `chunks` batch by batch, calling `progress(done, total)` after each upsert.
    pub async fn index_with_progress<P>(&self, chunks: &[Chunk], progress: P) -> Result<usize>
    where
        P: Fn(usize, usize),
    {
        let total = chunks.len();
        let mut done = 0;
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let (dense, sparse) = tokio::try_join!(self.embed_dense(texts.clone()), self.embed_sparse(texts))?;
            if dense.len() != batch.len() {
                return Err(Error::upstream(
                    Collaborator::DenseEmbedder,
                    format!("{} vectors for {} chunks", dense.len(), batch.len()),
                ));
            }
            let dim = self.dense.dim();
            if let Some(bad) = dense.iter().find(|v| v.len() != dim) {
                return Err(Error::upstream(Collaborator::DenseEmbedder, format!("vector has {} dims, expected {dim}", bad.len())));
            }
            let mut sparse = sparse.map(Vec::into_iter);
            let points: Vec<Point> = batch
                .iter()
                .zip(dense)
                .map(|(chunk, vector)| Point::from_chunk(chunk, vector, sparse.as_mut().and_then(Iterator::next)))
                .collect();
            self.store.upsert(points).await.map_err(|e| Error::upstream(Collaborator::CandidateStore, e))?;
            done += batch.len();
            tracing::debug!(done, total, "indexed batch");
            progress(done, total);
        }
        tracing::info!(chunks = done, "indexing complete");
        Ok(done)
    }

    async fn embed_dense(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embedder = Arc::clone(&self.dense);
        blocking(move || embedder.embed_dense(&texts)).await.map_err(|e| Error::upstream(Collaborator::DenseEmbedder, e))
    }

    async fn embed_sparse(&self, texts: Vec<String>) -> Result<Option<Vec<SparseVector>>> {
        let Some(embedder) = self.sparse.as_ref().map(Arc::clone) else {
            return Ok(None);
        };
        let expected = texts.len();
        let vectors = blocking(move || embedder.embed_sparse(&texts))
            .await
            .map_err(|e| Error::upstream(Collaborator::SparseEmbedder, e))?;
        if vectors.len() != expected {
            return Err(Error::upstream(Collaborator::SparseEmbedder, format!("{} vectors for {expected} chunks", vectors.len())));
        }
        Ok(Some(vectors))
    }
}
