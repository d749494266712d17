//! Document chunking: fixed word windows or embedding-guided sentence groups.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Error;
use crate::settings::{ChunkStrategy, ChunkingConfig};
use crate::traits::DenseEmbedder;
use crate::types::{Chunk, Meta, MetaValue};

/// A parsed source document (one page of a PDF, or a whole text file).
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub metadata: Meta,
}

impl Document {
    pub fn new(source: impl Into<String>, page_label: impl Into<String>, text: impl Into<String>) -> Self {
        let mut metadata = Meta::new();
        metadata.insert("source".to_string(), MetaValue::Text(source.into()));
        metadata.insert("page_label".to_string(), MetaValue::Text(page_label.into()));
        Self { text: text.into(), metadata }
    }

    pub fn source(&self) -> String {
        self.metadata.get("source").map(ToString::to_string).unwrap_or_default()
    }
}

/// Splits documents into retrievable chunks.
pub trait Chunker: Send + Sync {
    fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>>;

    fn chunk(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for document in documents {
            chunks.extend(self.chunk_document(document)?);
        }
        Ok(chunks)
    }

    /// Chunk every `.txt` file under `data_dir`, one document per file.
    fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        let files = list_txt_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), n = file_index + 1, total = files.len(), "chunking file");
            let content = read_file_content(file_path)?;
            let document = Document::new(file_path.to_string_lossy(), "1", content);
            all_chunks.extend(self.chunk_document(&document)?);
        }
        tracing::info!(files = files.len(), chunks = all_chunks.len(), "processed directory");
        Ok(all_chunks)
    }
}

/// Pick the chunker named by `config.strategy`.
///
/// The semantic strategy embeds sentences, so it needs a dense embedder.
pub fn build_chunker(
    config: &ChunkingConfig,
    embedder: Option<Arc<dyn DenseEmbedder>>,
) -> crate::error::Result<Box<dyn Chunker>> {
    match config.strategy {
        ChunkStrategy::Fixed => Ok(Box::new(FixedChunker::new(config.clone())?)),
        ChunkStrategy::Semantic => {
            let embedder = embedder
                .ok_or_else(|| Error::config("chunking.strategy 'semantic' requires a dense embedder"))?;
            Ok(Box::new(SemanticChunker::new(config.clone(), embedder)?))
        }
    }
}

/// Splits documents into overlapping windows of `chunk_size` words.
pub struct FixedChunker {
    config: ChunkingConfig,
}

impl Default for FixedChunker {
    fn default() -> Self { Self { config: ChunkingConfig::default() } }
}

impl FixedChunker {
    pub fn new(config: ChunkingConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    fn split_with_overlap(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let step = self.config.chunk_size - self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.config.chunk_size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end >= words.len() { break; }
            start += step;
        }
        chunks
    }
}

impl Chunker for FixedChunker {
    fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        Ok(into_chunks(document, self.split_with_overlap(&document.text)))
    }
}

/// Groups consecutive sentences, starting a new chunk where the embedding
/// distance between neighbouring sentences exceeds the configured percentile.
pub struct SemanticChunker {
    config: ChunkingConfig,
    embedder: Arc<dyn DenseEmbedder>,
}

impl SemanticChunker {
    pub fn new(config: ChunkingConfig, embedder: Arc<dyn DenseEmbedder>) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config, embedder })
    }

    fn split_semantic(&self, text: &str) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return Ok(sentences);
        }

        let buffer = self.config.buffer_size;
        let windows: Vec<String> = (0..sentences.len())
            .map(|i| {
                let lo = i.saturating_sub(buffer);
                let hi = (i + buffer + 1).min(sentences.len());
                sentences[lo..hi].join(" ")
            })
            .collect();
        let embeddings = self.embedder.embed_dense(&windows)?;
        if embeddings.len() != windows.len() {
            anyhow::bail!("embedder returned {} vectors for {} sentences", embeddings.len(), windows.len());
        }

        let distances: Vec<f32> = embeddings.windows(2).map(|w| 1.0 - cosine(&w[0], &w[1])).collect();
        let breakpoint = percentile(&distances, self.config.breakpoint_percentile_threshold);
        tracing::trace!(sentences = sentences.len(), breakpoint, "semantic breakpoints");

        let mut groups = Vec::new();
        let mut start = 0;
        for (i, distance) in distances.iter().enumerate() {
            if *distance > breakpoint {
                groups.push(sentences[start..=i].join(" "));
                start = i + 1;
            }
        }
        groups.push(sentences[start..].join(" "));
        Ok(groups)
    }
}

impl Chunker for SemanticChunker {
    fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        Ok(into_chunks(document, self.split_semantic(&document.text)?))
    }
}

fn into_chunks(document: &Document, texts: Vec<String>) -> Vec<Chunk> {
    let source = document.source();
    texts
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| {
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), MetaValue::Int(chunk_index as i64));
            Chunk { id: chunk_id(&source, &document.metadata, chunk_index, &text), text, metadata }
        })
        .collect()
}

/// Sentences end at `.`, `!` or `?` followed by whitespace or end of text.
/// Whitespace inside a sentence is collapsed to single spaces.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(['.', '!', '?']) {
            sentences.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        sentences.push(current.join(" "));
    }
    sentences
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

/// Linear-interpolated percentile, `p` in 0..=100.
fn percentile(values: &[f32], p: f32) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = (p / 100.0) * (sorted.len() - 1) as f32;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f32)
}

/// Stable chunk identity: blake3 over source, page, position and content.
pub fn chunk_id(source: &str, metadata: &Meta, chunk_index: usize, text: &str) -> String {
    let page = metadata.get("page_label").map(ToString::to_string).unwrap_or_default();
    let index = chunk_index.to_string();
    let mut hasher = blake3::Hasher::new();
    for part in [source, page.as_str(), index.as_str(), text] {
        hasher.update(part.as_bytes());
        hasher.update(&[0u8]);
    }
    hasher.finalize().to_hex().as_str()[..32].to_string()
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    txt_files.sort();
    txt_files
}
