//! Second-stage reranking of fused candidates.

use std::sync::Arc;
use std::time::Duration;

use ragdb_core::traits::RelevanceScorer;
use ragdb_core::types::{RankedList, Stage};
use ragdb_core::{Error, Result};

/// Second-stage reranking with a cross-encoder style scorer.
///
/// Scores every (query, candidate text) pair in one batched call and orders
/// candidates by that score. The stage-1 `score` is left in place; the new
/// score goes to `rerank_score`. Scorer errors and timeouts are fatal.
pub struct Reranker {
    scorer: Arc<dyn RelevanceScorer>,
    timeout: Duration,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>, timeout: Duration) -> Self { Self { scorer, timeout } }

    pub fn model_id(&self) -> &str { self.scorer.model_id() }

    pub async fn rerank(&self, query: &str, candidates: RankedList) -> Result<RankedList> {
        if candidates.is_empty() {
            return Ok(candidates);
        }
        let pairs: Vec<(String, String)> = candidates.iter().map(|c| (query.to_string(), c.text.clone())).collect();
        let scorer = Arc::clone(&self.scorer);
        let task = tokio::task::spawn_blocking(move || scorer.score(&pairs));
        let scores = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(scores))) => scores,
            Ok(Ok(Err(e))) => return Err(Error::rerank(e)),
            Ok(Err(join)) => return Err(Error::rerank(join)),
            Err(_) => return Err(Error::rerank(format!("timed out after {} ms", self.timeout.as_millis()))),
        };
        apply_scores(candidates, scores)
    }
}

/// Attach `scores` (same order as `candidates`) and sort by them, best first.
///
/// The sort is stable: equal rerank scores keep their input order. NaN sorts last.
pub fn apply_scores(mut candidates: RankedList, scores: Vec<f32>) -> Result<RankedList> {
    if scores.len() != candidates.len() {
        return Err(Error::rerank(format!("scorer returned {} scores for {} candidates", scores.len(), candidates.len())));
    }
    for (candidate, score) in candidates.iter_mut().zip(scores) {
        candidate.rerank_score = Some(if score.is_nan() { f32::NEG_INFINITY } else { score });
        candidate.stage = Stage::Reranked;
    }
    candidates.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
    Ok(candidates)
}
