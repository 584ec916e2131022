use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Feature, FeatureCandidate};

/// What one processed batch contributed to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// The transcript the batch came from, when there was one.
    pub id: Option<Uuid>,
    /// Candidates stored as new features during this call, in processing order.
    pub features: Vec<Feature>,
    /// Candidates absorbed into an existing feature, exactly as they arrived.
    pub duplicates: Vec<FeatureCandidate>,
}

impl ProcessingResult {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.duplicates.is_empty()
    }
}
