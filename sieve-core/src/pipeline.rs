//! Deduplication pipeline.
//!
//! Candidates are processed strictly in input order. Candidate *i + 1* searches an
//! index and store that already contain candidate *i*, which is how duplicates
//! within one batch are caught. Callers that share a store between batches must
//! serialize [`Pipeline::run`] calls; [`crate::Engine`] does this with a
//! single-writer lock.
//!
//! For each candidate every collaborator call (index queries, text merge,
//! embedding of the new texts) is awaited before the first mutation. Dropping
//! the future of a running batch therefore leaves each candidate either fully
//! processed or untouched.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::collaborators::TextMerger;
use crate::config::DedupConfig;
use crate::error::{ConfigError, Result};
use crate::index::SimilarityIndex;
use crate::models::{Feature, FeatureCandidate, ProcessingResult, RelatedFeature};
use crate::store::{AbsorbDuplicate, RecordStore};

/// How a candidate relates to what is already stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Nothing scored above the related threshold.
    New,
    /// The top match scored at or above the duplicate threshold.
    Duplicate { survivor: Feature, similarity: f64 },
    /// Every match, best first; none reached the duplicate threshold.
    Related(Vec<(Feature, f64)>),
}

/// Classify a candidate from its similar features.
///
/// `similar` must already be filtered by the related threshold and sorted best
/// first, as [`Pipeline::find_similar`] returns it.
pub fn classify(mut similar: Vec<(Feature, f64)>, config: &DedupConfig) -> Classification {
    match similar.first().map(|&(_, similarity)| similarity) {
        None => Classification::New,
        Some(top) if top >= config.duplicate_threshold => {
            let (survivor, similarity) = similar.swap_remove(0);
            Classification::Duplicate {
                survivor,
                similarity,
            }
        }
        Some(_) => Classification::Related(similar),
    }
}

#[derive(Clone)]
pub struct Pipeline {
    store: RecordStore,
    index: Arc<dyn SimilarityIndex>,
    merger: Arc<dyn TextMerger>,
    config: DedupConfig,
}

impl Pipeline {
    pub fn new(
        store: RecordStore,
        index: Arc<dyn SimilarityIndex>,
        merger: Arc<dyn TextMerger>,
        config: DedupConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            index,
            merger,
            config,
        })
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Classify and persist every candidate, in order.
    ///
    /// An integrity error (a store id that should exist but does not) stops the
    /// batch and is returned. Candidates before it stay processed.
    pub async fn run(&self, candidates: Vec<FeatureCandidate>) -> Result<ProcessingResult> {
        let total = candidates.len();
        let mut result = ProcessingResult::default();

        for (position, candidate) in candidates.into_iter().enumerate() {
            if let Err(e) = self.process_one(candidate, &mut result).await {
                error!(position, total, "Stopping batch: {}", e);
                return Err(e);
            }
        }

        // Later candidates in the batch may have linked back to, or merged into,
        // features stored earlier in it.
        let stored_ids: Vec<Uuid> = result.features.iter().map(|f| f.id).collect();
        result.features = stored_ids
            .into_iter()
            .filter_map(|id| self.store.feature(id))
            .collect();

        info!(
            total,
            new = result.features.len(),
            duplicates = result.duplicates.len(),
            "Processed feature batch"
        );
        Ok(result)
    }

    /// Existing features similar to `candidate`, best first.
    ///
    /// Title and summary are queried separately. Only scores strictly above the
    /// related threshold survive; each feature appears once with its best score.
    /// Index hits whose id no longer resolves in the store are dropped.
    pub async fn find_similar(&self, candidate: &FeatureCandidate) -> Result<Vec<(Feature, f64)>> {
        let limit = self.config.query_limit;
        let mut matches = self.index.query(&candidate.title, limit).await?;
        matches.extend(self.index.query(&candidate.summary, limit).await?);

        matches.retain(|m| m.similarity > self.config.related_threshold);
        // Stable: equal scores keep title-before-summary discovery order.
        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        let mut seen = HashSet::new();
        let mut similar = Vec::new();
        for m in matches {
            if !seen.insert(m.feature_id) {
                continue;
            }
            match self.store.feature(m.feature_id) {
                Some(feature) => similar.push((feature, m.similarity)),
                None => warn!(feature_id = %m.feature_id, "Dropping stale similarity index entry"),
            }
        }

        Ok(similar)
    }

    async fn process_one(
        &self,
        mut candidate: FeatureCandidate,
        result: &mut ProcessingResult,
    ) -> Result<()> {
        let similar = self.find_similar(&candidate).await?;

        match classify(similar, &self.config) {
            Classification::Duplicate {
                survivor,
                similarity,
            } => {
                debug!(
                    survivor = %survivor.id,
                    similarity,
                    title = %candidate.title,
                    "Merging duplicate feature"
                );
                let merged_text = self.merger.merge(&survivor, &candidate).await;
                self.store.features().update(
                    survivor.id,
                    AbsorbDuplicate {
                        incoming: &candidate,
                        merged_text,
                    },
                )?;
                result.duplicates.push(candidate);
            }
            Classification::Related(similar) => {
                let links: Vec<RelatedFeature> = similar
                    .iter()
                    .map(|(feature, similarity)| RelatedFeature {
                        feature_id: feature.id,
                        similarity: *similarity,
                    })
                    .collect();
                debug!(title = %candidate.title, related = links.len(), "Storing related feature");
                candidate.related_features = links.iter().copied().collect();
                let stored = self.store_new(candidate, &links).await?;
                result.features.push(stored);
            }
            Classification::New => {
                debug!(title = %candidate.title, "Storing new feature");
                let stored = self.store_new(candidate, &[]).await?;
                result.features.push(stored);
            }
        }

        Ok(())
    }

    async fn store_new(
        &self,
        candidate: FeatureCandidate,
        links: &[RelatedFeature],
    ) -> Result<Feature> {
        let title = self.index.prepare(&candidate.title).await?;
        let summary = self.index.prepare(&candidate.summary).await?;

        let stored = self.store.insert_linked(candidate, links)?;
        for prepared in [title, summary].into_iter().flatten() {
            self.index.commit(prepared, stored.id);
        }

        Ok(stored)
    }
}
