use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn embedder_for(server: &MockServer) -> OpenAiEmbedder {
    let config = OpenAiConfig {
        base_url: format!("{}/v1", server.uri()),
        ..OpenAiConfig::default()
    };
    OpenAiEmbedder::new(&config, "sk-test").expect("Failed to create embedder")
}

#[test]
fn embedder_configuration() {
    let config = OpenAiConfig::default();
    let embedder = OpenAiEmbedder::new(&config, "sk-test")
        .expect("Failed to create embedder")
        .with_expected_dimension(1536);

    assert_eq!(embedder.model, "text-embedding-3-small");
    assert_eq!(embedder.base_url.as_str(), "https://api.openai.com/v1/");
    assert_eq!(embedder.expected_dimension, Some(1536));
}

#[tokio::test]
async fn embeds_text_with_configured_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": "best calculus professor",
            "encoding_format": "float"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.1, -0.2, 0.3]}],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedding = embedder_for(&server)
        .embed("best calculus professor")
        .await
        .expect("embedding succeeds");

    assert_eq!(embedding.vector, vec![0.1, -0.2, 0.3]);
    assert_eq!(embedding.dimension(), 3);
}

#[tokio::test]
async fn rejects_empty_text_without_calling_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = embedder_for(&server).embed(" \t\n").await;
    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test]
async fn surfaces_provider_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided: sk-test.",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    match embedder_for(&server).embed("hello").await {
        Err(RagError::Embedding(message)) => {
            assert!(message.contains("401"), "message: {}", message);
            assert!(message.contains("Incorrect API key provided"), "message: {}", message);
        }
        other => panic!("expected embedding error, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_data_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let result = embedder_for(&server).embed("hello").await;
    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test]
async fn dimension_mismatch_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2]}]
        })))
        .mount(&server)
        .await;

    let embedder = embedder_for(&server).with_expected_dimension(1536);
    match embedder.embed("hello").await {
        Err(RagError::Embedding(message)) => assert!(message.contains("1536")),
        other => panic!("expected embedding error, got {:?}", other),
    }
}
