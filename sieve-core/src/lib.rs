//! Semantic deduplication and relationship engine for customer feature requests.
//!
//! Feature candidates extracted from customer conversations are checked against a
//! similarity index of everything stored so far. Each candidate is either merged
//! into an existing feature (duplicate), stored with bidirectional links to its
//! neighbours (related), or stored on its own (new).

pub mod collaborators;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod relations;
pub mod store;

pub use config::DedupConfig;
pub use engine::{Collaborators, Engine};
pub use error::{EngineError, Result};
