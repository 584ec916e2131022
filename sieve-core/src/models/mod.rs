//! Domain models for feature-sieve.
//!
//! # Core Concepts
//!
//! ## Stored Entities
//!
//! - [`Feature`]: A deduplicated product request. Created once, then only grown by
//!   duplicate merges and relation back-links. Never deleted.
//! - [`Transcript`]: The raw customer conversation a batch of candidates was
//!   extracted from. Immutable once stored.
//!
//! ## Transient Values
//!
//! - [`FeatureCandidate`]: A feature-shaped item that has not been classified yet.
//! - [`ExtractedFeature`]: Raw output of a text extractor, before it becomes a candidate.
//! - [`ProcessingResult`]: What one processed transcript contributed.

mod feature;
mod related;
mod result;
mod transcript;

pub use feature::*;
pub use related::*;
pub use result::*;
pub use transcript::*;
