//! Reciprocal rank fusion of independently scored candidate lists.
//!
//! Raw dense and sparse scores live on unrelated scales, so only ranks are
//! used: a candidate at 0-indexed rank `r` contributes `1 / (k + r + 1)`.

use std::collections::HashMap;

use ragdb_core::types::{ChunkId, FusionResult, RankedList, ScoredCandidate, Stage};

/// Standard RRF smoothing constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// Contribution of a candidate at 0-indexed `rank`.
pub fn rrf_contribution(k: u32, rank: usize) -> f64 {
    1.0 / (f64::from(k) + rank as f64 + 1.0)
}

/// Fuse a dense and a sparse list.
///
/// Each unique id appears once, scored by the sum of its contributions. When an
/// id is in both lists the dense payload is kept. Ties in fused score keep
/// first-seen order (dense ranks first, then sparse-only ids).
pub fn fuse(dense: RankedList, sparse: RankedList, k: u32) -> FusionResult {
    fuse_lists([dense, sparse], k)
}

/// Fuse any number of lists; earlier lists win payload conflicts and ties.
pub fn fuse_lists<I>(lists: I, k: u32) -> FusionResult
where
    I: IntoIterator<Item = RankedList>,
{
    // Pass 1: fold into first-seen order.
    let mut slots: HashMap<ChunkId, usize> = HashMap::new();
    let mut acc: Vec<(f64, ScoredCandidate)> = Vec::new();
    for list in lists {
        for (rank, candidate) in list.into_iter().enumerate() {
            let contribution = rrf_contribution(k, rank);
            match slots.get(&candidate.id) {
                Some(&slot) => acc[slot].0 += contribution,
                None => {
                    slots.insert(candidate.id.clone(), acc.len());
                    acc.push((contribution, candidate));
                }
            }
        }
    }

    // Pass 2: stable sort, so equal scores keep insertion order.
    acc.sort_by(|a, b| b.0.total_cmp(&a.0));
    acc.into_iter()
        .map(|(score, mut candidate)| {
            candidate.score = score as f32;
            candidate.stage = Stage::Fused;
            candidate
        })
        .collect()
}

/// Dense-only mode: same order, same raw similarity scores, re-tagged `fused`.
pub fn pass_through(dense: RankedList) -> FusionResult {
    dense
        .into_iter()
        .map(|mut candidate| {
            candidate.stage = Stage::Fused;
            candidate
        })
        .collect()
}
