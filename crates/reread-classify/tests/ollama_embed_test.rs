//! Embedding backend tests against a local mock Ollama server.
//!
//! These verify the request shape sent to `/api/embed` and the error
//! mapping the strategy chains depend on: unreachable servers and error
//! statuses fall through, malformed bodies do not.

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reread_classify::OllamaEmbedding;
use reread_core::{EmbeddingBackend, Error};

fn backend_for(server: &MockServer) -> OllamaEmbedding {
    OllamaEmbedding::with_config(server.uri(), "test-embed".to_string(), 3)
}

#[tokio::test]
async fn test_embed_texts_round_trip() {
    let mock_server = MockServer::start().await;

    let response = serde_json::json!({
        "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
    });

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-embed",
            "input": ["first", "second"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let vectors = backend
        .embed_texts(&["first".to_string(), "second".to_string()])
        .await
        .expect("embedding should succeed");

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vec![0.1, 0.2, 0.3]);
    assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
}

#[tokio::test]
async fn test_empty_input_skips_the_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let vectors = backend.embed_texts(&[]).await.unwrap();
    assert!(vectors.is_empty());
}

#[tokio::test]
async fn test_error_status_maps_to_backend_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let result = backend.embed_texts(&["text".to_string()]).await;

    match result {
        Err(Error::BackendUnavailable(msg)) => {
            assert!(msg.contains("500"), "message was: {}", msg);
        }
        other => panic!("Expected backend unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_maps_to_backend_unavailable() {
    // Start a server just to reserve a port, then shut it down.
    let uri = {
        let mock_server = MockServer::start().await;
        mock_server.uri()
    };

    let backend = OllamaEmbedding::with_config(uri, "test-embed".to_string(), 3);
    let result = backend.embed_texts(&["text".to_string()]).await;

    assert!(matches!(result, Err(Error::BackendUnavailable(_))));
}

#[tokio::test]
async fn test_malformed_body_is_a_real_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let result = backend.embed_texts(&["text".to_string()]).await;

    assert!(matches!(result, Err(Error::Embedding(_))));
}

#[tokio::test]
async fn test_embedding_count_mismatch_is_a_real_error() {
    let mock_server = MockServer::start().await;

    let response = serde_json::json!({ "embeddings": [[0.1, 0.2, 0.3]] });

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    let result = backend
        .embed_texts(&["first".to_string(), "second".to_string()])
        .await;

    assert!(matches!(result, Err(Error::Embedding(_))));
}

#[tokio::test]
async fn test_health_check_reflects_server_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": []
        })))
        .mount(&mock_server)
        .await;

    let backend = backend_for(&mock_server);
    assert!(backend.health_check().await);

    let offline_uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let offline = OllamaEmbedding::with_config(offline_uri, "test-embed".to_string(), 3);
    assert!(!offline.health_check().await);
}
