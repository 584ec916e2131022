//! Append-only similarity index over stored feature text.
//!
//! Every entry maps one embedded text to the feature id it was inserted for.
//! Entries are never updated or removed, so an id returned by [`SimilarityIndex::query`]
//! may no longer resolve in the record store; callers drop such matches.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::EmbeddingError;

/// One nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub feature_id: Uuid,
    /// In `[0, 1]`; 1.0 means identical meaning.
    pub similarity: f64,
}

/// Text that has been embedded but not yet attached to a feature.
///
/// Splitting insertion into `prepare` and `commit` lets the pipeline finish all
/// awaiting before it mutates anything.
#[derive(Debug, Clone)]
pub struct PreparedText {
    pub text: String,
    pub vector: Vec<f32>,
}

/// Nearest-neighbour lookup keyed by feature id.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Up to `limit` entries by descending similarity, earliest insertion first on ties.
    /// Blank `text` yields an empty result.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<SimilarityMatch>, EmbeddingError>;

    /// Embed `text` for a later [`commit`](Self::commit). `None` for blank text.
    async fn prepare(&self, text: &str) -> Result<Option<PreparedText>, EmbeddingError>;

    /// Append a prepared entry tagged with `feature_id`.
    fn commit(&self, prepared: PreparedText, feature_id: Uuid);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embed and append in one step. Blank `text` is a no-op.
    async fn insert(&self, text: &str, feature_id: Uuid) -> Result<(), EmbeddingError> {
        if let Some(prepared) = self.prepare(text).await? {
            self.commit(prepared, feature_id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    text: String,
    vector: Vec<f32>,
    feature_id: Uuid,
}

/// In-memory [`SimilarityIndex`] using cosine similarity over an [`Embedder`].
pub struct VectorIndex<E> {
    embedder: E,
    entries: Arc<RwLock<Vec<IndexEntry>>>,
}

impl<E: Embedder> VectorIndex<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Texts currently tagged with `feature_id`, in insertion order.
    pub fn entries_for(&self, feature_id: Uuid) -> Vec<String> {
        self.entries
            .read()
            .expect("similarity index lock poisoned")
            .iter()
            .filter(|entry| entry.feature_id == feature_id)
            .map(|entry| entry.text.clone())
            .collect()
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embedder.embed(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                got: vectors.len(),
            });
        }
        let vector = vectors.remove(0);
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                got: vector.len(),
            });
        }
        Ok(vector)
    }
}

#[async_trait]
impl<E: Embedder> SimilarityIndex for VectorIndex<E> {
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<SimilarityMatch>, EmbeddingError> {
        if is_blank(text) || limit == 0 {
            return Ok(Vec::new());
        }

        let query = self.embed_one(text).await?;
        let entries = self.entries.read().expect("similarity index lock poisoned");

        let mut matches: Vec<SimilarityMatch> = entries
            .iter()
            .map(|entry| SimilarityMatch {
                feature_id: entry.feature_id,
                similarity: cosine_similarity(&query, &entry.vector),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn prepare(&self, text: &str) -> Result<Option<PreparedText>, EmbeddingError> {
        if is_blank(text) {
            return Ok(None);
        }

        let vector = self.embed_one(text).await?;
        Ok(Some(PreparedText {
            text: text.to_string(),
            vector,
        }))
    }

    fn commit(&self, prepared: PreparedText, feature_id: Uuid) {
        self.entries
            .write()
            .expect("similarity index lock poisoned")
            .push(IndexEntry {
                text: prepared.text,
                vector: prepared.vector,
                feature_id,
            });
    }

    fn len(&self) -> usize {
        self.entries.read().expect("similarity index lock poisoned").len()
    }
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
