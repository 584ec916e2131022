//! Relationship merge algebra.
//!
//! Pure functions: no store access, no collaborator calls. The pipeline hands in
//! the text merger's outcome already resolved.

use tracing::warn;

use crate::error::MergeTextError;
use crate::models::{Feature, FeatureCandidate, MergedText, RelatedFeatures};

/// Union of two relation sets, keeping the maximum similarity per feature id.
///
/// The resulting set does not depend on argument order.
pub fn merge_related(a: &RelatedFeatures, b: &RelatedFeatures) -> RelatedFeatures {
    let mut merged = a.clone();
    for related in b.iter() {
        merged.insert(related.feature_id, related.similarity);
    }
    merged
}

/// Fold a duplicate candidate into its survivor.
///
/// Scores add up, the request count grows by one, relations and transcripts are
/// unioned. Title and summary come from the text merger; when it failed the
/// survivor keeps its own text. Everything else stays as the survivor had it.
pub fn merge_duplicate(
    survivor: &Feature,
    incoming: &FeatureCandidate,
    merged_text: Result<MergedText, MergeTextError>,
) -> Feature {
    let mut related_features = merge_related(&survivor.related_features, &incoming.related_features);
    related_features.remove(survivor.id);

    let (title, summary) = match merged_text {
        Ok(text) => (text.title, text.summary),
        Err(e) => {
            warn!(feature_id = %survivor.id, "Keeping survivor text: {}", e);
            (survivor.title.clone(), survivor.summary.clone())
        }
    };

    Feature {
        title,
        summary,
        importance_points: survivor.importance_points + incoming.importance_points,
        request_count: survivor.request_count.saturating_add(1),
        related_features,
        transcripts: survivor
            .transcripts
            .union(&incoming.transcripts)
            .copied()
            .collect(),
        ..survivor.clone()
    }
}
