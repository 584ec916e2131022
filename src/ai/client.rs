//! HTTP client for OpenAI-compatible chat completion and embedding APIs.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use sieve_core::collaborators::{parse_extracted_features, parse_merged_text, TextExtractor, TextMerger};
use sieve_core::embedding::Embedder;
use sieve_core::error::{EmbeddingError, ExtractionError, MergeTextError};
use sieve_core::models::*;

use super::chunking::{split_into_chunks, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use super::prompts;
use crate::config::OpenAiSettings;

const EXTRACTION_TEMPERATURE: f32 = 0.3;
const MERGE_TEMPERATURE: f32 = 0.5;

/// Model API errors.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Response(String),
}

impl From<AiError> for ExtractionError {
    fn from(e: AiError) -> Self {
        ExtractionError::Backend(e.to_string())
    }
}

impl From<AiError> for MergeTextError {
    fn from(e: AiError) -> Self {
        MergeTextError(e.to_string())
    }
}

impl From<AiError> for EmbeddingError {
    fn from(e: AiError) -> Self {
        EmbeddingError::Backend(e.to_string())
    }
}

/// Client for one OpenAI-compatible endpoint.
///
/// Acts as the text extractor, the text merger and the embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    embedding_model: String,
    embedding_dimension: usize,
    client: Client,
}

impl OpenAiClient {
    pub fn new(settings: &OpenAiSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            chat_model: settings.chat_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            embedding_dimension: settings.embedding_dimension,
            client: Client::new(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Send one user message and return the assistant's reply text.
    pub async fn complete(&self, prompt: String, temperature: f32) -> Result<String, AiError> {
        let body = json!({
            "model": &self.chat_model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        });
        let response = self.post("/chat/completions").json(&body).send().await?;
        let json = handle_response(response).await?;
        completion_content(&json)
    }

    /// One embedding per input, in input order.
    pub async fn embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AiError> {
        let body = json!({
            "model": &self.embedding_model,
            "input": texts,
        });
        let response = self.post("/embeddings").json(&body).send().await?;
        let json = handle_response(response).await?;
        parse_embeddings(&json)
    }
}

#[async_trait]
impl TextExtractor for OpenAiClient {
    async fn extract(&self, transcript: &Transcript) -> Result<Vec<ExtractedFeature>, ExtractionError> {
        let chunks = split_into_chunks(&transcript.content, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP);
        let mut features = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let reply = self
                .complete(prompts::extraction(chunk), EXTRACTION_TEMPERATURE)
                .await?;

            match parse_extracted_features(&reply) {
                Ok(extracted) => {
                    debug!(transcript_id = %transcript.id, chunk = i, count = extracted.len(), "Extracted features");
                    features.extend(extracted);
                }
                Err(e) => {
                    warn!(transcript_id = %transcript.id, chunk = i, "Error parsing extracted feature requests: {}", e);
                    debug!("Model response: {}", reply);
                }
            }
        }

        Ok(features)
    }
}

#[async_trait]
impl TextMerger for OpenAiClient {
    async fn merge(
        &self,
        survivor: &Feature,
        incoming: &FeatureCandidate,
    ) -> Result<MergedText, MergeTextError> {
        let reply = self
            .complete(prompts::merge(survivor, incoming), MERGE_TEMPERATURE)
            .await?;
        parse_merged_text(&reply).inspect_err(|_| debug!("Model response: {}", reply))
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(self.embeddings(texts).await?)
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }
}

/// Turn an error status into `AiError::Api`, preferring the API's own message.
async fn handle_response(response: reqwest::Response) -> Result<Value, AiError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| AiError::Response(e.to_string()));
    }

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| {
            json["error"]["message"]
                .as_str()
                .or_else(|| json["message"].as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);
    Err(AiError::Api {
        status: status.as_u16(),
        message,
    })
}

fn completion_content(json: &Value) -> Result<String, AiError> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AiError::Response("completion has no message content".to_string()))
}

fn parse_embeddings(json: &Value) -> Result<Vec<Vec<f32>>, AiError> {
    let data = json["data"]
        .as_array()
        .ok_or_else(|| AiError::Response("embedding response has no data".to_string()))?;

    let mut items = data
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let index = item["index"].as_u64().map_or(position, |i| i as usize);
            let vector: Vec<f32> = serde_json::from_value(item["embedding"].clone())
                .map_err(|e| AiError::Response(format!("bad embedding: {}", e)))?;
            Ok((index, vector))
        })
        .collect::<Result<Vec<_>, AiError>>()?;

    items.sort_by_key(|(index, _)| *index);
    Ok(items.into_iter().map(|(_, vector)| vector).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_first_choice() {
        let json = json!({
            "choices": [{ "message": { "role": "assistant", "content": "[]" } }]
        });
        assert_eq!(completion_content(&json).unwrap(), "[]");
    }

    #[test]
    fn missing_content_is_an_error() {
        let json = json!({ "choices": [] });
        assert!(matches!(completion_content(&json), Err(AiError::Response(_))));
    }

    #[test]
    fn orders_embeddings_by_index() {
        let json = json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        });
        assert_eq!(parse_embeddings(&json).unwrap(), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn rejects_non_numeric_embeddings() {
        let json = json!({ "data": [{ "index": 0, "embedding": "nope" }] });
        assert!(parse_embeddings(&json).is_err());
    }

    #[test]
    fn backend_errors_keep_their_message() {
        let err: ExtractionError = AiError::Api {
            status: 429,
            message: "Rate limit reached".to_string(),
        }
        .into();
        assert!(err.to_string().contains("Rate limit reached"));
    }
}
