use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use feature_sieve::ai::OpenAiClient;
use feature_sieve::config::OpenAiSettings;
use feature_sieve::sieve_core::collaborators::{TextExtractor, TextMerger};
use feature_sieve::sieve_core::embedding::Embedder;
use feature_sieve::sieve_core::error::{EmbeddingError, ExtractionError};
use feature_sieve::sieve_core::index::{SimilarityIndex, VectorIndex};
use feature_sieve::sieve_core::models::*;

/// Stand-in for an OpenAI-compatible API.
struct MockApi {
    status: StatusCode,
    reply: String,
    chat_calls: AtomicUsize,
    authorization: Mutex<Option<String>>,
}

async fn chat_completions(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    api.chat_calls.fetch_add(1, Ordering::SeqCst);
    *api.authorization.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if !api.status.is_success() {
        return (api.status, Json(json!({ "error": { "message": api.reply } })));
    }
    (
        api.status,
        Json(json!({
            "model": "mock",
            "choices": [{ "message": { "role": "assistant", "content": api.reply } }]
        })),
    )
}

async fn embeddings(Json(body): Json<Value>) -> Json<Value> {
    let inputs = body["input"].as_array().cloned().unwrap_or_default();
    // Returned in reverse to check the client reorders by index.
    let data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .rev()
        .map(|(i, text)| {
            let len = text.as_str().unwrap_or_default().len() as f32;
            json!({ "index": i, "embedding": [len, 1.0] })
        })
        .collect();
    Json(json!({ "data": data }))
}

async fn start(status: StatusCode, reply: &str) -> (OpenAiClient, Arc<MockApi>) {
    let api = Arc::new(MockApi {
        status,
        reply: reply.to_string(),
        chat_calls: AtomicUsize::new(0),
        authorization: Mutex::new(None),
    });
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/embeddings", post(embeddings))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = OpenAiClient::new(&OpenAiSettings {
        api_key: Some("sk-test".to_string()),
        base_url: format!("http://{}/v1/", addr),
        ..OpenAiSettings::default()
    });
    (client, api)
}

fn transcript(content: &str) -> Transcript {
    Transcript {
        id: Uuid::new_v4(),
        content: content.to_string(),
        timestamp: Utc::now(),
    }
}

mod extraction {
    use super::*;

    #[tokio::test]
    async fn parses_fenced_model_output() {
        let reply = "```json\n[{\"title\": \"Export to PDF\", \"summary\": \"Reports as PDF.\", \"score\": \"4\"}]\n```";
        let (client, api) = start(StatusCode::OK, reply).await;

        let features = client.extract(&transcript("Customer: PDFs please")).await.unwrap();

        assert_eq!(
            features,
            vec![ExtractedFeature {
                title: "Export to PDF".to_string(),
                summary: "Reports as PDF.".to_string(),
                importance_score: 4.0,
            }]
        );
        assert_eq!(api.authorization.lock().unwrap().as_deref(), Some("Bearer sk-test"));
    }

    #[tokio::test]
    async fn skips_a_chunk_with_unparsable_output() {
        let (client, _) = start(StatusCode::OK, "Sorry, I found no feature requests.").await;

        let features = client.extract(&transcript("Customer: thanks!")).await.unwrap();

        assert!(features.is_empty());
    }

    #[tokio::test]
    async fn sends_one_request_per_chunk() {
        let reply = r#"[{"title": "Dark mode", "summary": "Night theme.", "score": 2}]"#;
        let (client, api) = start(StatusCode::OK, reply).await;
        let long = "Customer: the dashboard is too bright at night.\n".repeat(400);

        let features = client.extract(&transcript(&long)).await.unwrap();

        let calls = api.chat_calls.load(Ordering::SeqCst);
        assert!(calls > 1);
        assert_eq!(features.len(), calls);
    }

    #[tokio::test]
    async fn api_errors_fail_extraction() {
        let (client, _) = start(StatusCode::UNAUTHORIZED, "Incorrect API key provided").await;

        let err = client.extract(&transcript("Customer: hello")).await.unwrap_err();

        match err {
            ExtractionError::Backend(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("Incorrect API key provided"));
            }
            other => panic!("expected a backend error, got {other:?}"),
        }
    }
}

mod merging {
    use super::*;

    fn pair() -> (Feature, FeatureCandidate) {
        let survivor = Feature::from_candidate(Uuid::new_v4(), FeatureCandidate::manual("Export to PDF"));
        (survivor, FeatureCandidate::manual("Export to Excel"))
    }

    #[tokio::test]
    async fn parses_merged_text() {
        let reply = r#"{"title": "Export to PDF and Excel", "summary": "Both formats.\n\nFor sharing and analysis."}"#;
        let (client, _) = start(StatusCode::OK, reply).await;
        let (survivor, incoming) = pair();

        let merged = client.merge(&survivor, &incoming).await.unwrap();

        assert_eq!(merged.title, "Export to PDF and Excel");
        assert_eq!(merged.summary, "Both formats.\n\nFor sharing and analysis.");
    }

    #[tokio::test]
    async fn unparsable_output_is_an_error() {
        let (client, _) = start(StatusCode::OK, "Here is the merged feature: Export").await;
        let (survivor, incoming) = pair();

        assert!(client.merge(&survivor, &incoming).await.is_err());
    }
}

mod embedding {
    use super::*;

    #[tokio::test]
    async fn returns_vectors_in_input_order() {
        let (client, _) = start(StatusCode::OK, "").await;

        let vectors = client
            .embed(&["a".to_string(), "abc".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 1.0], vec![3.0, 1.0]]);
    }

    #[tokio::test]
    async fn index_rejects_vectors_that_disagree_with_the_configured_dimension() {
        let (client, _) = start(StatusCode::OK, "").await;
        let index = VectorIndex::new(client);

        let err = index.prepare("Export to PDF").await.unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch { expected: 1536, got: 2 }
        ));
    }
}
