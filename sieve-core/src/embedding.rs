//! Text embedding providers.
//!
//! The engine never embeds text itself; it hands texts to an [`Embedder`]. The
//! [`LexicalEmbedder`] here is a deterministic offline baseline using feature
//! hashing over tokens. It is not a neural model, but identical and near-identical
//! wording lands close together, which is enough for offline runs and tests.

use std::sync::Arc;

use async_trait::async_trait;
use blake3::Hasher;

use crate::error::EmbeddingError;

/// Default dimensionality for lexical embeddings.
pub const DEFAULT_EMBEDDING_DIM: usize = 256;

/// Trait for embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn dimension(&self) -> usize;
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for Arc<T> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed(texts).await
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Deterministic feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct LexicalEmbedder {
    dim: usize,
}

impl LexicalEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_EMBEDDING_DIM)
    }

    pub fn with_dimension(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for LexicalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| lexical_embedding(text, self.dim))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

fn tokenize(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Hash every lowercase token into a signed bucket, then L2-normalise.
pub fn lexical_embedding(text: &str, dim: usize) -> Vec<f32> {
    if dim == 0 {
        return Vec::new();
    }

    let mut vec = vec![0.0f32; dim];
    let lowered = text.to_lowercase();

    for token in tokenize(&lowered) {
        let mut hasher = Hasher::new();
        hasher.update(token.as_bytes());
        let hash = hasher.finalize();
        let bytes = hash.as_bytes();

        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&bytes[..8]);
        let idx = (u64::from_le_bytes(bucket) % dim as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        vec[idx] += sign;
    }

    let norm = vec.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let inv = norm.recip() as f32;
        for x in &mut vec {
            *x *= inv;
        }
    }

    vec
}

/// Cosine similarity mapped into `[0, 1]`; opposite or unrelated vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}
