#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use sieve_core::collaborators::{TextExtractor, TextMerger};
use sieve_core::embedding::{Embedder, LexicalEmbedder};
use sieve_core::error::{EmbeddingError, ExtractionError, MergeTextError};
use sieve_core::index::{PreparedText, SimilarityIndex, SimilarityMatch};
use sieve_core::models::*;
use sieve_core::pipeline::Pipeline;
use sieve_core::store::RecordStore;
use sieve_core::DedupConfig;

/// Similarity index whose scores are declared up front.
///
/// Identical texts score 1.0, declared pairs score what they were given (in either
/// direction), everything else scores 0.0. Texts marked with `fail_prepare`
/// cannot be embedded for storage.
#[derive(Default)]
pub struct ScriptedIndex {
    scores: Mutex<HashMap<(String, String), f64>>,
    entries: Mutex<Vec<(String, Uuid)>>,
    unembeddable: Mutex<HashSet<String>>,
}

impl ScriptedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self, a: &str, b: &str, similarity: f64) {
        let mut scores = self.scores.lock().unwrap();
        scores.insert((a.to_string(), b.to_string()), similarity);
        scores.insert((b.to_string(), a.to_string()), similarity);
    }

    pub fn fail_prepare(&self, text: &str) {
        self.unembeddable.lock().unwrap().insert(text.to_string());
    }

    pub fn entries(&self) -> Vec<(String, Uuid)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn entries_for(&self, feature_id: Uuid) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(_, id)| *id == feature_id)
            .map(|(text, _)| text)
            .collect()
    }

    fn similarity(&self, query: &str, stored: &str) -> f64 {
        if query == stored {
            return 1.0;
        }
        self.scores
            .lock()
            .unwrap()
            .get(&(query.to_string(), stored.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

#[async_trait]
impl SimilarityIndex for ScriptedIndex {
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<SimilarityMatch>, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut matches: Vec<_> = self
            .entries()
            .into_iter()
            .map(|(stored, feature_id)| SimilarityMatch {
                feature_id,
                similarity: self.similarity(text, &stored),
            })
            .collect();
        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn prepare(&self, text: &str) -> Result<Option<PreparedText>, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if self.unembeddable.lock().unwrap().contains(text) {
            return Err(EmbeddingError::Backend("embedding service unavailable".to_string()));
        }
        Ok(Some(PreparedText {
            text: text.to_string(),
            vector: Vec::new(),
        }))
    }

    fn commit(&self, prepared: PreparedText, feature_id: Uuid) {
        self.entries.lock().unwrap().push((prepared.text, feature_id));
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Lexical embedder that fails on its `fail_on`-th call and every call after.
pub struct FlakyEmbedder {
    inner: LexicalEmbedder,
    fail_on: usize,
    pub calls: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: LexicalEmbedder::new(),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.fail_on {
            return Err(EmbeddingError::Backend("connection reset".to_string()));
        }
        self.inner.embed(texts).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

/// Merger that joins both titles and counts its calls.
#[derive(Default)]
pub struct JoiningMerger {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextMerger for JoiningMerger {
    async fn merge(
        &self,
        survivor: &Feature,
        incoming: &FeatureCandidate,
    ) -> Result<MergedText, MergeTextError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MergedText {
            title: format!("{} / {}", survivor.title, incoming.title),
            summary: format!("{}\n\n{}", survivor.summary, incoming.summary),
        })
    }
}

/// Merger that always fails, like a model returning unparseable output.
pub struct FailingMerger;

#[async_trait]
impl TextMerger for FailingMerger {
    async fn merge(
        &self,
        _survivor: &Feature,
        _incoming: &FeatureCandidate,
    ) -> Result<MergedText, MergeTextError> {
        Err(MergeTextError("model returned prose instead of JSON".to_string()))
    }
}

/// Extractor returning a fixed list for every transcript.
pub struct StaticExtractor(pub Vec<ExtractedFeature>);

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract(&self, _transcript: &Transcript) -> Result<Vec<ExtractedFeature>, ExtractionError> {
        Ok(self.0.clone())
    }
}

pub struct FailingExtractor;

#[async_trait]
impl TextExtractor for FailingExtractor {
    async fn extract(&self, _transcript: &Transcript) -> Result<Vec<ExtractedFeature>, ExtractionError> {
        Err(ExtractionError::Malformed("expected value at line 1 column 1".to_string()))
    }
}

pub fn candidate(title: &str, summary: &str, importance_points: f64) -> FeatureCandidate {
    FeatureCandidate {
        title: title.to_string(),
        summary: summary.to_string(),
        importance_points,
        request_count: 1,
        related_features: RelatedFeatures::new(),
        transcripts: BTreeSet::from([Uuid::new_v4()]),
        timestamp: Utc::now(),
    }
}

pub fn extracted(title: &str, summary: &str, importance_score: f64) -> ExtractedFeature {
    ExtractedFeature {
        title: title.to_string(),
        summary: summary.to_string(),
        importance_score,
    }
}

pub struct Harness {
    pub store: RecordStore,
    pub index: Arc<ScriptedIndex>,
    pub merger: Arc<JoiningMerger>,
    pub pipeline: Pipeline,
}

pub fn harness() -> Harness {
    harness_with(DedupConfig::default())
}

pub fn harness_with(config: DedupConfig) -> Harness {
    let store = RecordStore::new();
    let index = Arc::new(ScriptedIndex::new());
    let merger = Arc::new(JoiningMerger::default());
    let pipeline = Pipeline::new(store.clone(), index.clone(), merger.clone(), config)
        .expect("valid config");
    Harness {
        store,
        index,
        merger,
        pipeline,
    }
}
