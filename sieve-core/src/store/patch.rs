use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Patch;
use crate::error::MergeTextError;
use crate::models::{Feature, FeatureCandidate, MergedText, RelatedFeatures};
use crate::relations::merge_duplicate;

/// Partial update for a feature. All fields are optional; `None` leaves the field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturePatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub importance_points: Option<f64>,
    pub request_count: Option<u32>,
    pub related_features: Option<RelatedFeatures>,
    pub transcripts: Option<BTreeSet<Uuid>>,
}

impl Patch<Feature> for FeaturePatch {
    fn apply(self, feature: &mut Feature) {
        if let Some(title) = self.title {
            feature.title = title;
        }
        if let Some(summary) = self.summary {
            feature.summary = summary;
        }
        if let Some(points) = self.importance_points {
            feature.importance_points = points;
        }
        if let Some(count) = self.request_count {
            feature.request_count = count;
        }
        if let Some(mut related) = self.related_features {
            related.remove(feature.id);
            feature.related_features = related;
        }
        if let Some(transcripts) = self.transcripts {
            feature.transcripts = transcripts;
        }
    }
}

/// Back-link from an existing feature to a newly stored one.
#[derive(Debug, Clone, Copy)]
pub struct LinkRelated {
    pub feature_id: Uuid,
    pub similarity: f64,
}

impl Patch<Feature> for LinkRelated {
    fn apply(self, feature: &mut Feature) {
        feature.link(self.feature_id, self.similarity);
    }
}

/// Fold a duplicate candidate into the current version of its survivor.
#[derive(Debug)]
pub struct AbsorbDuplicate<'a> {
    pub incoming: &'a FeatureCandidate,
    pub merged_text: Result<MergedText, MergeTextError>,
}

impl Patch<Feature> for AbsorbDuplicate<'_> {
    fn apply(self, feature: &mut Feature) {
        *feature = merge_duplicate(feature, self.incoming, self.merged_text);
    }
}
