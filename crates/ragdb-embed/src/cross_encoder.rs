use anyhow::{anyhow, ensure, Result};
use candle_core::{DType, Device};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaForSequenceClassification};
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

use ragdb_core::traits::RelevanceScorer;

use crate::device::select_device;
use crate::tokenize::{tokenize_pairs, XLMR_PAD_ID};
use crate::weights::{load_config, load_tokenizer, load_var_builder};

const BATCH_SIZE: usize = 8;

/// XLM-RoBERTa sequence classifier with a single relevance logit
/// (bge-reranker family). Scores are sigmoid probabilities.
pub struct CrossEncoderScorer {
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    model_id: String,
}

impl CrossEncoderScorer {
    pub fn load(model_dir: &Path, model_id: &str, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(model = model_id, dir = %model_dir.display(), "loading reranker");
        let mut tokenizer = load_tokenizer(model_dir)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_len,
                strategy: TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
        let config: XLMRobertaConfig = load_config(model_dir)?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = XLMRobertaForSequenceClassification::new(1, &config, vb)?;
        tracing::info!(model = model_id, "reranker loaded");
        Ok(Self { model, tokenizer, device, max_len, model_id: model_id.to_string() })
    }

    fn score_chunk(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        let batch = tokenize_pairs(&self.tokenizer, pairs, self.max_len, XLMR_PAD_ID, &self.device)?;
        let logits = self.model.forward(&batch.input_ids, &batch.attention_mask, &batch.token_type_ids)?;
        let probs = candle_nn::ops::sigmoid(&logits)?;
        let scores: Vec<f32> = probs.to_dtype(DType::F32)?.to_device(&Device::Cpu)?.flatten_all()?.to_vec1()?;
        ensure!(scores.len() == pairs.len(), "reranker returned {} scores for {} pairs", scores.len(), pairs.len());
        Ok(scores)
    }
}

impl RelevanceScorer for CrossEncoderScorer {
    fn model_id(&self) -> &str { &self.model_id }

    fn score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(pairs.len());
        for chunk in pairs.chunks(BATCH_SIZE) {
            out.extend(self.score_chunk(chunk)?);
        }
        Ok(out)
    }
}
