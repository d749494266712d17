use std::sync::Arc;

use ragdb_core::traits::Generator;
use ragdb_core::types::ScoredCandidate;
use ragdb_core::{Error, Result};

use crate::prompt::render_prompt;

pub const SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Turns retrieved context into an answer.
pub struct InferenceEngine {
    generator: Arc<dyn Generator>,
}

impl InferenceEngine {
    pub fn new(generator: Arc<dyn Generator>) -> Self { Self { generator } }

    pub async fn answer(&self, query: &str, docs: &[ScoredCandidate]) -> Result<String> {
        let prompt = render_prompt(query, docs);
        tracing::debug!(docs = docs.len(), "generating answer");
        self.generator.generate(SYSTEM_MESSAGE, &prompt).await.map_err(Error::generation)
    }
}
