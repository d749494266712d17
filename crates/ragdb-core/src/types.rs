//! Domain types shared by the embedders, stores and the retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type ChunkId = String;
pub type Meta = BTreeMap<String, MetaValue>;

/// A scalar metadata value attached to a chunk (source document, page label, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Int(i) => write!(f, "{i}"),
            MetaValue::Float(x) => write!(f, "{x}"),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self { MetaValue::Text(s.to_string()) }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self { MetaValue::Text(s) }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self { MetaValue::Int(i) }
}

impl From<f64> for MetaValue {
    fn from(x: f64) -> Self { MetaValue::Float(x) }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self { MetaValue::Bool(b) }
}

/// An atomic retrievable unit of text.
///
/// - `id`: stable unique identifier, used as the merge key during fusion
/// - `text`: the chunk content handed to the reranker and the generator
/// - `metadata`: `source`, `page_label` and any other scalar fields
///
/// Chunks are created once during ingestion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: Meta,
}

/// Which retrieval stage last ordered a candidate.
///
/// For `Reranked` candidates the list order follows `rerank_score`, not `score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Dense,
    Sparse,
    Fused,
    Reranked,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Dense => "dense",
            Stage::Sparse => "sparse",
            Stage::Fused => "fused",
            Stage::Reranked => "reranked",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A chunk together with the score assigned by one retrieval stage.
///
/// `score` is only comparable with scores from the same stage: raw similarity
/// for `dense`/`sparse`, an RRF value for hybrid `fused` lists. Reranking keeps
/// `score` untouched and records the cross-encoder output in `rerank_score`;
/// [`ScoredCandidate::rank_score`] is the value a list is actually ordered by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: ChunkId,
    pub text: String,
    pub metadata: Meta,
    pub score: f32,
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}

impl ScoredCandidate {
    pub fn new(id: impl Into<ChunkId>, text: impl Into<String>, metadata: Meta, score: f32, stage: Stage) -> Self {
        Self { id: id.into(), text: text.into(), metadata, score, stage, rerank_score: None }
    }

    /// The key the candidate's list is sorted by: `rerank_score` once reranked
    /// (missing counts as worst), `score` for every earlier stage.
    pub fn rank_score(&self) -> f32 {
        match self.stage {
            Stage::Reranked => self.rerank_score.unwrap_or(f32::NEG_INFINITY),
            _ => self.score,
        }
    }

    /// Metadata value rendered as text, if present.
    pub fn meta_str(&self, key: &str) -> Option<String> {
        self.metadata.get(key).map(ToString::to_string)
    }
}

/// Candidates ordered best-first; rank 0 is the best.
pub type RankedList = Vec<ScoredCandidate>;

/// A [`RankedList`] whose scores are fusion values.
pub type FusionResult = RankedList;

/// Term-weight representation: parallel `indices`/`values`, indices strictly ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Build from unordered (index, value) pairs; repeated indices are summed.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, f32)>,
    {
        let merged: BTreeMap<u32, f32> = pairs.into_iter().fold(BTreeMap::new(), |mut acc, (i, v)| {
            *acc.entry(i).or_insert(0.0) += v;
            acc
        });
        let (indices, values) = merged.into_iter().unzip();
        Self { indices, values }
    }

    pub fn len(&self) -> usize { self.indices.len() }

    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    /// Dot product over the shared indices. Returns `None` when nothing overlaps.
    pub fn dot(&self, other: &SparseVector) -> Option<f32> {
        let (mut i, mut j) = (0usize, 0usize);
        let mut sum = 0.0f32;
        let mut overlap = false;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    overlap = true;
                    i += 1;
                    j += 1;
                }
            }
        }
        overlap.then_some(sum)
    }
}

/// Named vector kinds held by the candidate store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorKind {
    Dense,
    Sparse,
}

impl VectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorKind::Dense => "dense",
            VectorKind::Sparse => "sparse",
        }
    }

    /// Stage tag for candidates returned by a search on this kind.
    pub fn stage(&self) -> Stage {
        match self {
            VectorKind::Dense => Stage::Dense,
            VectorKind::Sparse => Stage::Sparse,
        }
    }
}

impl fmt::Display for VectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A query in one of the store's vector spaces.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryVector {
    Dense(Vec<f32>),
    Sparse(SparseVector),
}

impl QueryVector {
    pub fn kind(&self) -> VectorKind {
        match self {
            QueryVector::Dense(_) => VectorKind::Dense,
            QueryVector::Sparse(_) => VectorKind::Sparse,
        }
    }
}

/// A stored point: both vector kinds plus the chunk payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: ChunkId,
    pub dense: Vec<f32>,
    pub sparse: Option<SparseVector>,
    pub text: String,
    pub metadata: Meta,
}

impl Point {
    pub fn from_chunk(chunk: &Chunk, dense: Vec<f32>, sparse: Option<SparseVector>) -> Self {
        Self { id: chunk.id.clone(), dense, sparse, text: chunk.text.clone(), metadata: chunk.metadata.clone() }
    }

    pub fn to_candidate(&self, score: f32, stage: Stage) -> ScoredCandidate {
        ScoredCandidate::new(self.id.clone(), self.text.clone(), self.metadata.clone(), score, stage)
    }
}
