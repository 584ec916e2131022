use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RelatedFeatures, Transcript};

/// A deduplicated product request built up from customer conversations.
///
/// Features are created exactly once, either by the deduplication pipeline
/// (`request_count = 1`) or by manual addition (`request_count = 0`). After that
/// they only change when a later candidate is merged into them as a duplicate,
/// or when a later related candidate links back to them.
///
/// # Invariants
/// - `related_features` never contains `id`.
/// - `transcripts` only grows.
/// - `timestamp` is the creation time of the originating candidate, not of any merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    /// Sum of the importance scores of every candidate folded into this feature.
    pub importance_points: f64,
    /// Number of raw mentions folded into this feature.
    pub request_count: u32,
    pub related_features: RelatedFeatures,
    /// Transcripts that contributed to this feature.
    pub transcripts: BTreeSet<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl Feature {
    /// Build a stored feature from a candidate and a freshly assigned id.
    pub fn from_candidate(id: Uuid, candidate: FeatureCandidate) -> Self {
        let mut related_features = candidate.related_features;
        related_features.remove(id);

        Self {
            id,
            title: candidate.title,
            summary: candidate.summary,
            importance_points: candidate.importance_points,
            request_count: candidate.request_count,
            related_features,
            transcripts: candidate.transcripts,
            timestamp: candidate.timestamp,
        }
    }

    /// Record a relation to another feature. Self-relations are ignored.
    pub fn link(&mut self, feature_id: Uuid, similarity: f64) {
        if feature_id != self.id {
            self.related_features.insert(feature_id, similarity);
        }
    }
}

/// A feature-shaped item that has not been classified yet.
///
/// Candidates are what the pipeline consumes. A candidate that turns out to be a
/// duplicate is reported back as-is and never gets a store entry of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCandidate {
    pub title: String,
    pub summary: String,
    pub importance_points: f64,
    pub request_count: u32,
    #[serde(default)]
    pub related_features: RelatedFeatures,
    #[serde(default)]
    pub transcripts: BTreeSet<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl FeatureCandidate {
    /// Turn an extractor result into pipeline input for the given transcript.
    pub fn from_extracted(extracted: ExtractedFeature, transcript: &Transcript) -> Self {
        Self {
            title: extracted.title,
            summary: extracted.summary,
            importance_points: sanitize_points(extracted.importance_score),
            request_count: 1,
            related_features: RelatedFeatures::new(),
            transcripts: BTreeSet::from([transcript.id]),
            timestamp: transcript.timestamp,
        }
    }

    /// A manually added feature: the text becomes the title, nothing has requested it yet.
    pub fn manual(text: impl Into<String>) -> Self {
        Self {
            title: text.into(),
            summary: String::new(),
            importance_points: 0.0,
            request_count: 0,
            related_features: RelatedFeatures::new(),
            transcripts: BTreeSet::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Output of a text extractor for one feature request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeature {
    pub title: String,
    pub summary: String,
    /// Importance for the customer, nominally 0 (low) to 5 (high).
    pub importance_score: f64,
}

/// Combined text produced by a text merger for two duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedText {
    pub title: String,
    pub summary: String,
}

/// Input for manually adding a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeatureInput {
    pub text: String,
}

/// Sort features for presentation: importance first, then how often the feature was
/// requested, then how connected it is.
pub fn rank_features(features: &mut [Feature]) {
    features.sort_by(|a, b| {
        b.importance_points
            .total_cmp(&a.importance_points)
            .then_with(|| b.request_count.cmp(&a.request_count))
            .then_with(|| b.related_features.len().cmp(&a.related_features.len()))
    });
}

fn sanitize_points(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(title: &str, importance_points: f64, request_count: u32) -> Feature {
        Feature::from_candidate(
            Uuid::new_v4(),
            FeatureCandidate {
                title: title.to_string(),
                summary: String::new(),
                importance_points,
                request_count,
                related_features: RelatedFeatures::new(),
                transcripts: BTreeSet::new(),
                timestamp: Utc::now(),
            },
        )
    }

    #[test]
    fn link_ignores_self_relation() {
        let mut f = feature("Export to PDF", 3.0, 1);
        let own_id = f.id;
        f.link(own_id, 0.99);
        assert!(f.related_features.is_empty());
    }

    #[test]
    fn from_candidate_strips_a_preassigned_self_relation() {
        let id = Uuid::new_v4();
        let mut candidate = FeatureCandidate::manual("Dark mode");
        candidate.related_features.insert(id, 0.7);

        let f = Feature::from_candidate(id, candidate);
        assert!(!f.related_features.contains(id));
    }

    #[test]
    fn rank_orders_by_importance_then_requests_then_relations() {
        let mut connected = feature("connected", 2.0, 2);
        connected.link(Uuid::new_v4(), 0.7);
        let mut features = vec![
            feature("low", 1.0, 9),
            feature("isolated", 2.0, 2),
            feature("popular", 2.0, 5),
            connected,
            feature("high", 4.0, 1),
        ];

        rank_features(&mut features);

        let titles: Vec<_> = features.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, ["high", "popular", "connected", "isolated", "low"]);
    }

    #[test]
    fn negative_or_invalid_scores_become_zero() {
        assert_eq!(sanitize_points(-2.0), 0.0);
        assert_eq!(sanitize_points(f64::NAN), 0.0);
        assert_eq!(sanitize_points(3.5), 3.5);
    }
}
