//! In-process record store: one keyed table per entity kind.

mod patch;
mod table;

pub use patch::*;
pub use table::{Patch, Record, Table};

use uuid::Uuid;

use crate::error::{RecordKind, StoreError};
use crate::models::{Feature, FeatureCandidate, RelatedFeature, Transcript};

/// Owner of the feature and transcript tables.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct RecordStore {
    features: Table<Feature>,
    transcripts: Table<Transcript>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn features(&self) -> &Table<Feature> {
        &self.features
    }

    pub fn transcripts(&self) -> &Table<Transcript> {
        &self.transcripts
    }

    /// Store `candidate` and write a back-link into every feature in `links`.
    ///
    /// Runs under one write lock on the feature table. If any linked id is
    /// missing, nothing is written.
    pub fn insert_linked(
        &self,
        candidate: FeatureCandidate,
        links: &[RelatedFeature],
    ) -> Result<Feature, StoreError> {
        let mut rows = self.features.write();

        if let Some(missing) = links.iter().find(|link| !rows.contains(link.feature_id)) {
            return Err(StoreError::NotFound {
                kind: RecordKind::Feature,
                id: missing.feature_id,
            });
        }

        let stored = rows.insert(candidate).clone();
        for link in links {
            if let Some(neighbour) = rows.get_mut(link.feature_id) {
                LinkRelated {
                    feature_id: stored.id,
                    similarity: link.similarity,
                }
                .apply(neighbour);
            }
        }

        Ok(stored)
    }

    pub fn feature(&self, id: Uuid) -> Option<Feature> {
        self.features.get(id)
    }

    pub fn transcript(&self, id: Uuid) -> Option<Transcript> {
        self.transcripts.get(id)
    }
}
