use super::{AIError, HttpModelClient, ModelClient};
use crate::config::{AIConfig, AIProvider};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

async fn setup(provider: AIProvider) -> (ServerGuard, HttpModelClient) {
    let server = Server::new_async().await;
    let config = AIConfig {
        provider,
        model: "test-model".to_string(),
        api_url: Some(server.url()),
        timeout_secs: 5,
        max_tokens: 100,
        anthropic_api_key: Some("test_key".to_string()),
        openai_api_key: Some("test_key".to_string()),
    };
    let client = HttpModelClient::new(&config).unwrap();
    (server, client)
}

#[tokio::test]
async fn test_ollama_chat_response() {
    let (mut server, client) = setup(AIProvider::Ollama).await;

    let mock = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({"model": "test-model", "stream": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "model": "test-model",
                "message": {"role": "assistant", "content": "## Root Cause Analysis\nDisk full"},
                "done": true
            })
            .to_string(),
        )
        .create_async()
        .await;

    let completion = client.complete("why").await.unwrap();
    assert_eq!(completion.text, "## Root Cause Analysis\nDisk full");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_anthropic_messages_response() {
    let (mut server, client) = setup(AIProvider::Anthropic).await;

    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test_key")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_body(
            json!({
                "id": "msg_1",
                "role": "assistant",
                "content": [{"type": "text", "text": "Restart the unit"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    assert_eq!(client.complete("why").await.unwrap().text, "Restart the unit");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_chat_completions_response() {
    let (mut server, client) = setup(AIProvider::OpenAI).await;

    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test_key")
        .with_status(200)
        .with_body(
            json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Check DNS"}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    assert_eq!(client.complete("why").await.unwrap().text, "Check DNS");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let cases = [
        (401, "auth"),
        (429, "rate"),
        (500, "api"),
    ];

    for (status, kind) in cases {
        let (mut server, client) = setup(AIProvider::Anthropic).await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(status)
            .with_body("nope")
            .expect(1)
            .create_async()
            .await;

        let err = client.complete("why").await.unwrap_err();
        match kind {
            "auth" => assert!(matches!(err, AIError::Unauthorized { provider: "anthropic" })),
            "rate" => assert!(matches!(err, AIError::RateLimited { .. })),
            _ => assert!(matches!(err, AIError::Status { status, .. } if status.as_u16() == 500)),
        }
        // A single request proves there was no retry.
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let (mut server, client) = setup(AIProvider::Ollama).await;
    server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body("this is not json")
        .create_async()
        .await;

    let err = client.complete("why").await.unwrap_err();
    assert!(matches!(err, AIError::Malformed { .. }));
}

#[tokio::test]
async fn test_missing_api_key_fails_before_request() {
    let config = AIConfig {
        provider: AIProvider::Anthropic,
        anthropic_api_key: None,
        api_url: Some("http://127.0.0.1:9".to_string()),
        ..AIConfig::default()
    };
    let client = HttpModelClient::new(&config).unwrap();
    let err = client.complete("why").await.unwrap_err();
    assert!(matches!(err, AIError::MissingApiKey("Anthropic")));
    assert_eq!(client.describe(), format!("anthropic:{}", config.model));
}

#[tokio::test]
async fn test_blank_answer_is_rejected() {
    let (mut server, client) = setup(AIProvider::OpenAI).await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(json!({"choices": [{"message": {"role": "assistant", "content": "  "}}]}).to_string())
        .create_async()
        .await;

    let err = client.complete("why").await.unwrap_err();
    assert!(matches!(err, AIError::EmptyAnswer));
    assert_eq!(err.to_string(), "model returned an empty answer");
}
