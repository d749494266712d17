use anyhow::{ensure, Result};
use candle_core::{DType, Device, Tensor};
use candle_transformers::models::bert::{BertForMaskedLM, Config as BertConfig};
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;

use ragdb_core::traits::SparseEmbedder;
use ragdb_core::types::SparseVector;

use crate::device::select_device;
use crate::tokenize::{tokenize_texts, BERT_PAD_ID};
use crate::weights::{load_config, load_tokenizer, load_var_builder};

const BATCH_SIZE: usize = 16;

/// SPLADE learned sparse encoder: BERT masked-LM logits turned into
/// vocabulary term weights with `log(1 + relu(x))`, max-pooled over tokens.
pub struct SpladeEmbedder {
    model: BertForMaskedLM,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
}

impl SpladeEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading sparse model");
        let tokenizer = load_tokenizer(model_dir)?;
        let config: BertConfig = load_config(model_dir)?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = BertForMaskedLM::load(vb, &config)?;
        tracing::info!("sparse model loaded");
        Ok(Self { model, tokenizer, device, max_len })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
        let start = Instant::now();
        let batch = tokenize_texts(&self.tokenizer, texts, self.max_len, BERT_PAD_ID, &self.device)?;
        let logits = self.model.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let weights = term_weights(&logits, &batch.attention_mask)?;
        let rows: Vec<Vec<f32>> = weights.to_device(&Device::Cpu)?.to_vec2()?;
        ensure!(rows.len() == texts.len(), "model produced {} rows for {} texts", rows.len(), texts.len());
        tracing::debug!(n = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "sparse batch");
        Ok(rows.iter().map(|row| to_sparse(row)).collect())
    }
}

/// `[B, T, V]` logits and `[B, T]` mask to `[B, V]` term weights.
pub fn term_weights(logits: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let logits = logits.to_dtype(DType::F32)?;
    let activated = (logits.relu()? + 1.0)?.log()?;
    let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    activated.broadcast_mul(&mask)?.max(1)
}

/// Keep the non-zero vocabulary weights of one row.
fn to_sparse(row: &[f32]) -> SparseVector {
    SparseVector::from_pairs(row.iter().enumerate().filter(|(_, v)| **v > 0.0).map(|(i, v)| (i as u32, *v)))
}

impl SparseEmbedder for SpladeEmbedder {
    fn embed_sparse(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            out.extend(self.embed_chunk(chunk)?);
        }
        Ok(out)
    }
}
