//! ragdb-hybrid
//!
//! Two-stage retrieval over a [`CandidateStore`](ragdb_core::traits::CandidateStore):
//! dense and sparse candidates are fused with reciprocal rank fusion, reranked
//! by a relevance scorer and truncated. Also hosts the [`Indexer`] that fills
//! the store.

pub mod fusion;
pub mod ingest;
pub mod rerank;
pub mod retriever;

pub use fusion::{fuse, fuse_lists, pass_through, DEFAULT_RRF_K};
pub use ingest::Indexer;
pub use rerank::Reranker;
pub use retriever::{HybridRetriever, RetrieverBuilder};
