use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::table::Table;
use lancedb::{connect, Connection, DistanceType};

use ragdb_core::traits::CandidateStore;
use ragdb_core::types::{Point, QueryVector, RankedList, Stage};

use crate::rank::top_k;
use crate::schema::{ID, VECTOR};
use crate::search::{dense_hits, sparse_points};
use crate::writer::{batch_reader, points_to_record_batch};

/// Candidate store backed by a LanceDB table.
///
/// Dense search uses LanceDB cosine vector search. Sparse vectors are stored
/// as parallel index/value lists and scored by a full scan.
pub struct LanceStore {
    db: Connection,
    table_name: String,
    dim: usize,
}

impl LanceStore {
    pub async fn open(uri: &str, table_name: &str, dim: usize) -> Result<Self> {
        let db = connect(uri).execute().await?;
        tracing::info!(uri, table = table_name, "opened lancedb");
        Ok(Self { db, table_name: table_name.to_string(), dim })
    }

    async fn table(&self) -> Result<Option<Table>> {
        let names = self.db.table_names().execute().await?;
        if !names.contains(&self.table_name) { return Ok(None); }
        Ok(Some(self.db.open_table(&self.table_name).execute().await?))
    }
}

#[async_trait]
impl CandidateStore for LanceStore {
    async fn upsert(&self, points: Vec<Point>) -> Result<()> {
        if points.is_empty() { return Ok(()); }
        let batch = points_to_record_batch(&points, self.dim)?;
        match self.table().await? {
            Some(table) => {
                let mut merge = table.merge_insert(&[ID]);
                merge.when_matched_update_all(None).when_not_matched_insert_all();
                merge.execute(batch_reader(batch)).await?;
            }
            None => {
                self.db.create_table(&self.table_name, batch_reader(batch)).execute().await?;
            }
        }
        tracing::debug!(upserted = points.len(), table = %self.table_name, "lancedb upsert");
        Ok(())
    }

    async fn search(&self, query: &QueryVector, k: usize) -> Result<RankedList> {
        let Some(table) = self.table().await? else { return Ok(Vec::new()) };
        match query {
            QueryVector::Dense(q) => {
                if q.len() != self.dim {
                    bail!("query has {} dense dims, table expects {}", q.len(), self.dim);
                }
                let mut stream = table
                    .vector_search(q.clone())?
                    .column(VECTOR)
                    .distance_type(DistanceType::Cosine)
                    .limit(k)
                    .execute()
                    .await?;
                let mut hits = Vec::new();
                while let Some(batch) = stream.try_next().await? {
                    hits.extend(dense_hits(&batch)?);
                }
                hits.sort_by(|a, b| b.score.total_cmp(&a.score));
                hits.truncate(k);
                Ok(hits)
            }
            QueryVector::Sparse(q) => {
                let mut stream = table.query().execute().await?;
                let mut points = Vec::new();
                while let Some(batch) = stream.try_next().await? {
                    points.extend(sparse_points(&batch)?);
                }
                let scored = points
                    .iter()
                    .filter_map(|p| p.sparse.as_ref().and_then(|s| s.dot(q)).map(|score| (score, p)))
                    .collect();
                Ok(top_k(scored, k, Stage::Sparse))
            }
        }
    }

    async fn count(&self) -> Result<usize> {
        match self.table().await? {
            Some(table) => Ok(table.count_rows(None).await?),
            None => Ok(0),
        }
    }
}
