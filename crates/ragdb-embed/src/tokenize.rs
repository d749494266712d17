use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use tokenizers::{Encoding, Tokenizer};

/// XLM-RoBERTa `<pad>` id.
pub const XLMR_PAD_ID: u32 = 1;
/// BERT `[PAD]` id.
pub const BERT_PAD_ID: u32 = 0;

/// Model inputs for one padded batch: `(input_ids, attention_mask, token_type_ids)`, each `[B, max_len]`.
pub struct Batch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

fn pad_to(enc: &Encoding, max_len: usize, pad_id: u32, ids: &mut Vec<u32>, mask: &mut Vec<u32>) {
    let mut row_ids = enc.get_ids().to_vec();
    let mut row_mask = enc.get_attention_mask().to_vec();
    row_ids.truncate(max_len);
    row_mask.truncate(max_len);
    let pad = max_len - row_ids.len();
    row_ids.extend(std::iter::repeat(pad_id).take(pad));
    row_mask.extend(std::iter::repeat(0).take(pad));
    ids.extend(row_ids);
    mask.extend(row_mask);
}

fn to_batch(encodings: &[Encoding], max_len: usize, pad_id: u32, device: &Device) -> Result<Batch> {
    let rows = encodings.len();
    let mut ids = Vec::with_capacity(rows * max_len);
    let mut mask = Vec::with_capacity(rows * max_len);
    for enc in encodings {
        pad_to(enc, max_len, pad_id, &mut ids, &mut mask);
    }
    Ok(Batch {
        input_ids: Tensor::from_vec(ids, (rows, max_len), device)?,
        attention_mask: Tensor::from_vec(mask, (rows, max_len), device)?,
        token_type_ids: Tensor::zeros((rows, max_len), DType::I64, device)?,
    })
}

/// Tokenize single texts, truncated/padded with `pad_id` to `max_len`.
pub fn tokenize_texts(tokenizer: &Tokenizer, texts: &[String], max_len: usize, pad_id: u32, device: &Device) -> Result<Batch> {
    let encodings = texts
        .iter()
        .map(|t| tokenizer.encode(t.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e)))
        .collect::<Result<Vec<_>>>()?;
    to_batch(&encodings, max_len, pad_id, device)
}

/// Tokenize (query, text) pairs as one sequence each, truncated/padded to `max_len`.
pub fn tokenize_pairs(
    tokenizer: &Tokenizer,
    pairs: &[(String, String)],
    max_len: usize,
    pad_id: u32,
    device: &Device,
) -> Result<Batch> {
    let encodings = pairs
        .iter()
        .map(|(q, t)| tokenizer.encode((q.as_str(), t.as_str()), true).map_err(|e| anyhow!("Tokenization failed: {}", e)))
        .collect::<Result<Vec<_>>>()?;
    to_batch(&encodings, max_len, pad_id, device)
}
