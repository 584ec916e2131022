//! Seams to the AI collaborators the engine depends on.
//!
//! The engine only sees these traits. Network-backed implementations live in the
//! application crate; the ones here run offline.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ExtractionError, MergeTextError};
use crate::models::{ExtractedFeature, Feature, FeatureCandidate, MergedText, Transcript};

/// Turns a transcript into feature requests.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, transcript: &Transcript) -> Result<Vec<ExtractedFeature>, ExtractionError>;
}

/// Combines the text of a survivor and a duplicate candidate.
///
/// Safe to retry, but the engine never retries it.
#[async_trait]
pub trait TextMerger: Send + Sync {
    async fn merge(
        &self,
        survivor: &Feature,
        incoming: &FeatureCandidate,
    ) -> Result<MergedText, MergeTextError>;
}

/// Merger that keeps the survivor's text unchanged.
#[derive(Debug, Clone, Default)]
pub struct KeepSurvivorText;

#[async_trait]
impl TextMerger for KeepSurvivorText {
    async fn merge(
        &self,
        survivor: &Feature,
        _incoming: &FeatureCandidate,
    ) -> Result<MergedText, MergeTextError> {
        Ok(MergedText {
            title: survivor.title.clone(),
            summary: survivor.summary.clone(),
        })
    }
}

/// Extractor for transcripts whose content already is a JSON array of
/// `{title, summary, score}` objects.
#[derive(Debug, Clone, Default)]
pub struct JsonTranscriptExtractor;

#[async_trait]
impl TextExtractor for JsonTranscriptExtractor {
    async fn extract(&self, transcript: &Transcript) -> Result<Vec<ExtractedFeature>, ExtractionError> {
        parse_extracted_features(&transcript.content)
    }
}

#[derive(Debug, Deserialize)]
struct RawExtractedFeature {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default, alias = "importance_score", alias = "importanceScore")]
    score: serde_json::Value,
}

/// Parse extractor output: a JSON array of `{title, summary, score}`, optionally
/// wrapped in a markdown code fence.
///
/// `score` may be a number or a numeric string; anything else counts as 0.
/// Entries with neither title nor summary are skipped.
pub fn parse_extracted_features(raw: &str) -> Result<Vec<ExtractedFeature>, ExtractionError> {
    let items: Vec<RawExtractedFeature> = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

    Ok(items
        .into_iter()
        .filter_map(|item| {
            if item.title.trim().is_empty() && item.summary.trim().is_empty() {
                debug!("Skipping extracted feature without text");
                return None;
            }
            Some(ExtractedFeature {
                importance_score: score_value(&item.score),
                title: item.title.trim().to_string(),
                summary: item.summary.trim().to_string(),
            })
        })
        .collect())
}

/// Parse merger output: a JSON object `{title, summary}`, optionally fenced.
pub fn parse_merged_text(raw: &str) -> Result<MergedText, MergeTextError> {
    let merged: MergedText =
        serde_json::from_str(strip_code_fence(raw)).map_err(|e| MergeTextError(e.to_string()))?;

    if merged.title.trim().is_empty() {
        return Err(MergeTextError("merged title is empty".to_string()));
    }
    Ok(merged)
}

fn score_value(value: &serde_json::Value) -> f64 {
    let score = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Model output often arrives wrapped in ```json fences.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}
