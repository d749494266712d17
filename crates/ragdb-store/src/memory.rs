use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use ragdb_core::traits::CandidateStore;
use ragdb_core::types::{ChunkId, Point, QueryVector, RankedList, Stage};

use crate::rank::{cosine, top_k};

#[derive(Default)]
struct Inner {
    points: Vec<Point>,
    slots: HashMap<ChunkId, usize>,
}

/// In-process candidate store with exhaustive search.
///
/// Dense scores are cosine similarities; sparse scores are dot products over
/// shared term indices, and points sharing no term with the query are not
/// returned. Equal scores keep insertion order.
pub struct MemoryStore {
    dim: usize,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(dim: usize) -> Self { Self { dim, inner: RwLock::new(Inner::default()) } }

    pub fn dim(&self) -> usize { self.dim }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn upsert(&self, points: Vec<Point>) -> Result<()> {
        for p in &points {
            if p.dense.len() != self.dim {
                bail!("point '{}' has {} dense dims, store expects {}", p.id, p.dense.len(), self.dim);
            }
        }
        let mut inner = self.inner.write().map_err(|_| anyhow!("memory store lock poisoned"))?;
        let n = points.len();
        for p in points {
            match inner.slots.get(&p.id).copied() {
                Some(slot) => inner.points[slot] = p,
                None => {
                    let slot = inner.points.len();
                    inner.slots.insert(p.id.clone(), slot);
                    inner.points.push(p);
                }
            }
        }
        tracing::debug!(upserted = n, total = inner.points.len(), "memory store upsert");
        Ok(())
    }

    async fn search(&self, query: &QueryVector, k: usize) -> Result<RankedList> {
        let inner = self.inner.read().map_err(|_| anyhow!("memory store lock poisoned"))?;
        let hits = match query {
            QueryVector::Dense(q) => {
                if q.len() != self.dim {
                    bail!("query has {} dense dims, store expects {}", q.len(), self.dim);
                }
                let scored = inner.points.iter().map(|p| (cosine(q, &p.dense), p)).collect();
                top_k(scored, k, Stage::Dense)
            }
            QueryVector::Sparse(q) => {
                let scored = inner
                    .points
                    .iter()
                    .filter_map(|p| p.sparse.as_ref().and_then(|s| s.dot(q)).map(|score| (score, p)))
                    .collect();
                top_k(scored, k, Stage::Sparse)
            }
        };
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.read().map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(inner.points.len())
    }
}
