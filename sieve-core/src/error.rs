//! Error taxonomy for the engine.
//!
//! Integrity errors (`NotFound`) stop the batch they occur in. Collaborator
//! quality errors (`ExtractionError`, `MergeTextError`) are absorbed where they
//! happen with a logged fallback. Blank text handed to the index is a no-op and
//! has no error type at all.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// The entity table an id was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Feature,
    Transcript,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "features",
            Self::Transcript => "transcripts",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Item with ID \"{id}\" not found in table \"{kind}\"")]
    NotFound { kind: RecordKind, id: Uuid },
}

/// The text extractor produced nothing usable for a transcript.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Malformed extractor output: {0}")]
    Malformed(String),

    #[error("Extractor backend failed: {0}")]
    Backend(String),
}

/// The text merger could not combine two duplicates.
#[derive(Debug, Error)]
#[error("Text merge failed: {0}")]
pub struct MergeTextError(pub String);

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding backend failed: {0}")]
    Backend(String),

    #[error("Embedding backend returned {got} vectors for {expected} texts")]
    CountMismatch { expected: usize, got: usize },

    #[error("Embedding has {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("related threshold {related} exceeds duplicate threshold {duplicate}")]
    ThresholdOrder { related: f64, duplicate: f64 },

    #[error("query limit must be at least 1")]
    ZeroQueryLimit,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
