mod handlers;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::get,
    Router,
};
use sieve_core::Engine;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn create_router(engine: Arc<Engine>) -> Router {
    create_router_with_cors(engine, None)
}

/// Router with CORS restricted to `origins`. `None` allows any origin.
pub fn create_router_with_cors(engine: Arc<Engine>, origins: Option<&[String]>) -> Router {
    let api = Router::new()
        // Features
        .route("/features", get(handlers::list_features).post(handlers::create_feature))
        .route("/features/{id}", get(handlers::get_feature))
        // Transcripts
        .route(
            "/transcripts",
            get(handlers::list_transcripts).post(handlers::process_transcript),
        )
        .route("/transcripts/{id}", get(handlers::get_transcript))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(origins)),
        )
        .with_state(engine)
}

fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = origins else {
        return CorsLayer::permissive();
    };

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(allowed)
}
