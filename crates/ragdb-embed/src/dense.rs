use anyhow::{ensure, Result};
use candle_core::Device;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;

use ragdb_core::traits::DenseEmbedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::{tokenize_texts, XLMR_PAD_ID};
use crate::weights::{load_config, load_tokenizer, load_var_builder};

const BATCH_SIZE: usize = 16;

/// BGE-M3 dense encoder: XLM-RoBERTa with masked-mean pooling and L2 norm.
pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl BgeM3Embedder {
    pub fn load(model_dir: &Path, dim: usize, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading dense model");
        let tokenizer = load_tokenizer(model_dir)?;
        let config: XLMRobertaConfig = load_config(model_dir)?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!("dense model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let batch = tokenize_texts(&self.tokenizer, texts, self.max_len, XLMR_PAD_ID, &self.device)?;
        let hidden = self.model.forward(&batch.input_ids, &batch.attention_mask, &batch.token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        for row in &rows {
            ensure!(row.len() == self.dim, "model produced {} dims, expected {}", row.len(), self.dim);
        }
        tracing::debug!(n = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(rows)
    }
}

impl DenseEmbedder for BgeM3Embedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_dense(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            out.extend(self.embed_chunk(chunk)?);
        }
        Ok(out)
    }
}
