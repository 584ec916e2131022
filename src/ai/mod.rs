//! Model-backed collaborators: feature extraction, duplicate text merging and
//! embeddings against an OpenAI-compatible API.

pub mod chunking;
mod client;
mod prompts;

use std::sync::Arc;

use sieve_core::index::VectorIndex;
use sieve_core::Collaborators;

use crate::config::Settings;

pub use client::{AiError, OpenAiClient};

/// Pick collaborators for the configured mode: the model API when an API key
/// is set, offline implementations otherwise.
pub fn collaborators(settings: &Settings) -> Collaborators {
    if settings.is_offline() {
        tracing::info!("No OPENAI_API_KEY set, running with offline collaborators");
        return Collaborators::offline();
    }

    let client = Arc::new(OpenAiClient::new(&settings.openai));
    tracing::info!(
        base_url = %settings.openai.base_url,
        chat_model = %settings.openai.chat_model,
        embedding_model = %settings.openai.embedding_model,
        "Using model API collaborators"
    );

    Collaborators {
        extractor: client.clone(),
        merger: client.clone(),
        index: Arc::new(VectorIndex::new(client)),
    }
}
