use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One edge of the relation graph, as presented to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelatedFeature {
    pub feature_id: Uuid,
    /// Strongest similarity ever observed between the two features.
    pub similarity: f64,
}

/// Set of related features, unique by `feature_id`.
///
/// Storage order is irrelevant; every presentation path (`sorted`, serde) yields
/// the entries by descending similarity, ties broken by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<RelatedFeature>", into = "Vec<RelatedFeature>")]
pub struct RelatedFeatures(HashMap<Uuid, f64>);

impl RelatedFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, feature_id: Uuid) -> bool {
        self.0.contains_key(&feature_id)
    }

    pub fn get(&self, feature_id: Uuid) -> Option<f64> {
        self.0.get(&feature_id).copied()
    }

    /// Record a relation, keeping the maximum similarity if one already exists.
    pub fn insert(&mut self, feature_id: Uuid, similarity: f64) {
        self.0
            .entry(feature_id)
            .and_modify(|current| *current = current.max(similarity))
            .or_insert(similarity);
    }

    pub fn remove(&mut self, feature_id: Uuid) -> Option<f64> {
        self.0.remove(&feature_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = RelatedFeature> + '_ {
        self.0.iter().map(|(&feature_id, &similarity)| RelatedFeature {
            feature_id,
            similarity,
        })
    }

    /// Entries by descending similarity.
    pub fn sorted(&self) -> Vec<RelatedFeature> {
        let mut related: Vec<_> = self.iter().collect();
        related.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.feature_id.cmp(&b.feature_id))
        });
        related
    }
}

impl FromIterator<(Uuid, f64)> for RelatedFeatures {
    fn from_iter<I: IntoIterator<Item = (Uuid, f64)>>(iter: I) -> Self {
        let mut related = Self::new();
        for (feature_id, similarity) in iter {
            related.insert(feature_id, similarity);
        }
        related
    }
}

impl FromIterator<RelatedFeature> for RelatedFeatures {
    fn from_iter<I: IntoIterator<Item = RelatedFeature>>(iter: I) -> Self {
        iter.into_iter()
            .map(|r| (r.feature_id, r.similarity))
            .collect()
    }
}

impl From<Vec<RelatedFeature>> for RelatedFeatures {
    fn from(related: Vec<RelatedFeature>) -> Self {
        related.into_iter().collect()
    }
}

impl From<RelatedFeatures> for Vec<RelatedFeature> {
    fn from(related: RelatedFeatures) -> Self {
        related.sorted()
    }
}
