use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use sieve_core::models::*;
use sieve_core::{Engine, EngineError};

// ============================================================
// Error Handling
// ============================================================

/// Map an engine error to a response. Missing records are a 404; anything else
/// is logged server-side and returned as a generic 500.
fn engine_error(e: EngineError) -> (StatusCode, String) {
    if e.is_not_found() {
        tracing::warn!("Record not found: {}", e);
        return (StatusCode::NOT_FOUND, e.to_string());
    }

    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn bad_request(msg: &str) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

/// Pagination parameters for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0) as usize;
        let items = items.into_iter().skip(offset);
        match self.limit {
            Some(limit) => items.take(limit as usize).collect(),
            None => items.collect(),
        }
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Features
// ============================================================

/// Features in presentation order (most important first).
pub async fn list_features(
    State(engine): State<Arc<Engine>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Feature>> {
    Json(query.apply(engine.ranked_features()))
}

pub async fn get_feature(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Feature>, (StatusCode, String)> {
    engine
        .feature(id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Feature not found".to_string()))
}

pub async fn create_feature(
    State(engine): State<Arc<Engine>>,
    Json(input): Json<CreateFeatureInput>,
) -> Result<(StatusCode, Json<Feature>), (StatusCode, String)> {
    let text = input.text.trim();
    if text.is_empty() {
        return Err(bad_request("Feature is required"));
    }

    engine
        .add_feature(text)
        .await
        .map(|f| (StatusCode::CREATED, Json(f)))
        .map_err(engine_error)
}

// ============================================================
// Transcripts
// ============================================================

pub async fn list_transcripts(
    State(engine): State<Arc<Engine>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Transcript>> {
    Json(query.apply(engine.transcripts()))
}

pub async fn get_transcript(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transcript>, (StatusCode, String)> {
    engine
        .transcript(id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Transcript not found".to_string()))
}

/// Store a transcript, extract its feature requests and deduplicate them.
pub async fn process_transcript(
    State(engine): State<Arc<Engine>>,
    Json(input): Json<ProcessTranscriptInput>,
) -> Result<Json<ProcessingResult>, (StatusCode, String)> {
    if input.content.trim().is_empty() {
        return Err(bad_request("Invalid transcript content"));
    }

    engine
        .process_transcript(input.content)
        .await
        .map(Json)
        .map_err(engine_error)
}
