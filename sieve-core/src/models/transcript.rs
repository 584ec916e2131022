use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw customer conversation that features were extracted from.
///
/// Transcripts are immutable once stored; the store offers no patch for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A transcript that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTranscript {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl NewTranscript {
    pub fn now(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Input for submitting a transcript for processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTranscriptInput {
    pub content: String,
}
