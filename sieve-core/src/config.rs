use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Deduplication policy.
///
/// A top match scoring at or above `duplicate_threshold` absorbs the candidate.
/// Matches must score strictly above `related_threshold` to count at all, so a
/// score sitting exactly on it is treated as unrelated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub duplicate_threshold: f64,
    pub related_threshold: f64,
    /// Nearest neighbours fetched per query (title and summary are queried separately).
    pub query_limit: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: 0.85,
            related_threshold: 0.60,
            query_limit: 5,
        }
    }
}

impl DedupConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("duplicate_threshold", self.duplicate_threshold),
            ("related_threshold", self.related_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if self.related_threshold > self.duplicate_threshold {
            return Err(ConfigError::ThresholdOrder {
                related: self.related_threshold,
                duplicate: self.duplicate_threshold,
            });
        }

        if self.query_limit == 0 {
            return Err(ConfigError::ZeroQueryLimit);
        }

        Ok(())
    }
}
