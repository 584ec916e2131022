//! Engine façade: the record store, similarity index and collaborators wired
//! together behind one single-writer lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::collaborators::{JsonTranscriptExtractor, KeepSurvivorText, TextExtractor, TextMerger};
use crate::config::DedupConfig;
use crate::embedding::LexicalEmbedder;
use crate::error::{ConfigError, Result};
use crate::index::{SimilarityIndex, VectorIndex};
use crate::models::*;
use crate::pipeline::Pipeline;
use crate::store::RecordStore;

/// External collaborators the engine calls into.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn TextExtractor>,
    pub merger: Arc<dyn TextMerger>,
    pub index: Arc<dyn SimilarityIndex>,
}

impl Collaborators {
    /// Offline collaborators: JSON transcripts, survivor text kept on merge,
    /// lexical embeddings.
    pub fn offline() -> Self {
        Self {
            extractor: Arc::new(JsonTranscriptExtractor),
            merger: Arc::new(KeepSurvivorText),
            index: Arc::new(VectorIndex::new(LexicalEmbedder::new())),
        }
    }
}

pub struct Engine {
    store: RecordStore,
    index: Arc<dyn SimilarityIndex>,
    extractor: Arc<dyn TextExtractor>,
    pipeline: Pipeline,
    // Held for every feature mutation; batches never interleave.
    writer: Mutex<()>,
}

impl Engine {
    pub fn new(collaborators: Collaborators, config: DedupConfig) -> Result<Self, ConfigError> {
        let store = RecordStore::new();
        let pipeline = Pipeline::new(
            store.clone(),
            Arc::clone(&collaborators.index),
            collaborators.merger,
            config,
        )?;

        Ok(Self {
            store,
            index: collaborators.index,
            extractor: collaborators.extractor,
            pipeline,
            writer: Mutex::new(()),
        })
    }

    pub fn offline(config: DedupConfig) -> Result<Self, ConfigError> {
        Self::new(Collaborators::offline(), config)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn index(&self) -> &dyn SimilarityIndex {
        self.index.as_ref()
    }

    pub fn config(&self) -> &DedupConfig {
        self.pipeline.config()
    }

    /// Store a transcript, extract its feature requests and deduplicate them.
    ///
    /// An extraction failure is logged and contributes no candidates; the
    /// transcript stays stored.
    pub async fn process_transcript(&self, content: impl Into<String>) -> Result<ProcessingResult> {
        let transcript = self.store.transcripts().put(NewTranscript::now(content));
        info!(transcript_id = %transcript.id, "Processing transcript");

        let extracted = match self.extractor.extract(&transcript).await {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(transcript_id = %transcript.id, "Feature extraction failed: {}", e);
                Vec::new()
            }
        };

        let candidates = extracted
            .into_iter()
            .map(|feature| FeatureCandidate::from_extracted(feature, &transcript))
            .collect();

        let mut result = self.process_candidates(candidates).await?;
        result.id = Some(transcript.id);
        Ok(result)
    }

    /// Deduplicate a batch of candidates against everything stored so far.
    pub async fn process_candidates(&self, candidates: Vec<FeatureCandidate>) -> Result<ProcessingResult> {
        let _writer = self.writer.lock().await;
        self.pipeline.run(candidates).await
    }

    /// Manually add a feature. It skips deduplication but its title is indexed,
    /// so later candidates can match it.
    pub async fn add_feature(&self, text: &str) -> Result<Feature> {
        let _writer = self.writer.lock().await;

        let prepared = self.index.prepare(text).await?;
        let feature = self.store.features().put(FeatureCandidate::manual(text));
        if let Some(prepared) = prepared {
            self.index.commit(prepared, feature.id);
        }

        info!(feature_id = %feature.id, "Added feature manually");
        Ok(feature)
    }

    /// All features in creation order.
    pub fn features(&self) -> Vec<Feature> {
        self.store.features().list()
    }

    /// All features in presentation order.
    pub fn ranked_features(&self) -> Vec<Feature> {
        let mut features = self.features();
        rank_features(&mut features);
        features
    }

    pub fn feature(&self, id: Uuid) -> Option<Feature> {
        self.store.feature(id)
    }

    pub fn transcripts(&self) -> Vec<Transcript> {
        self.store.transcripts().list()
    }

    pub fn transcript(&self, id: Uuid) -> Option<Transcript> {
        self.store.transcript(id)
    }
}
