//! Feature-hashing embedders.
//!
//! Deterministic and model-free: used for tests, offline development and as
//! the lexical (sparse) side of hybrid retrieval.

use anyhow::Result;
use std::collections::HashMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

use ragdb_core::traits::{DenseEmbedder, SparseEmbedder};
use ragdb_core::types::SparseVector;

const STOP_WORDS: &[&str] = &[
    "a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// Lowercased alphanumeric terms with stop words removed.
pub fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

fn hash_term(term: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(term.as_bytes());
    hasher.finish()
}

fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
    for x in values.iter_mut() { *x /= norm; }
}

/// Dense vectors built by hashing terms into `dim` buckets.
pub struct HashedDenseEmbedder {
    dim: usize,
}

impl HashedDenseEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, term) in terms(text).iter().enumerate() {
            let h = hash_term(term);
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        l2_normalize(&mut v);
        v
    }
}

impl DenseEmbedder for HashedDenseEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_dense(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Sparse term-weight vectors: `1 + ln(tf)` per hashed term, L2-normalised.
pub struct HashedSparseEmbedder {
    vocab_size: u32,
}

impl HashedSparseEmbedder {
    pub fn new(vocab_size: u32) -> Self { Self { vocab_size: vocab_size.max(1) } }

    fn embed_one(&self, text: &str) -> SparseVector {
        let mut tf: HashMap<u32, u32> = HashMap::new();
        for term in terms(text) {
            let idx = (hash_term(&term) % u64::from(self.vocab_size)) as u32;
            *tf.entry(idx).or_insert(0) += 1;
        }
        let mut sv = SparseVector::from_pairs(tf.into_iter().map(|(i, n)| (i, 1.0 + (n as f32).ln())));
        l2_normalize(&mut sv.values);
        sv
    }
}

impl SparseEmbedder for HashedSparseEmbedder {
    fn embed_sparse(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
