use anyhow::Result;
use std::collections::HashSet;

use ragdb_core::traits::RelevanceScorer;

use crate::hashed::terms;

/// Scores a pair by the fraction of distinct query terms found in the text.
///
/// Model-free stand-in for a cross-encoder when no reranker weights are available.
pub struct LexicalOverlapScorer {
    id: String,
}

impl Default for LexicalOverlapScorer {
    fn default() -> Self { Self { id: "lexical-overlap".to_string() } }
}

impl LexicalOverlapScorer {
    pub fn new() -> Self { Self::default() }
}

impl RelevanceScorer for LexicalOverlapScorer {
    fn model_id(&self) -> &str { &self.id }

    fn score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        Ok(pairs
            .iter()
            .map(|(query, text)| {
                let query_terms: HashSet<String> = terms(query).into_iter().collect();
                if query_terms.is_empty() { return 0.0; }
                let text_terms: HashSet<String> = terms(text).into_iter().collect();
                let hits = query_terms.iter().filter(|t| text_terms.contains(*t)).count();
                hits as f32 / query_terms.len() as f32
            })
            .collect())
    }
}
