use super::*;
use crate::config::GeminiConfig;
use crate::testing::{sample_batch, ScriptedTransport};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

const TIMEOUT: Duration = Duration::from_secs(5);

fn proxy(server: &Server) -> ProxyTransport {
    ProxyTransport::new(format!("{}/api/trivia", server.url()), TIMEOUT).unwrap()
}

fn gemini(server: &Server) -> GeminiTransport {
    let config = GeminiConfig {
        api_url: format!("{}/v1beta", server.url()),
        api_key: Some("test-key".to_string()),
        ..GeminiConfig::default()
    };
    GeminiTransport::new(&config, TIMEOUT).unwrap()
}

fn gemini_body(questions: serde_json::Value) -> String {
    let text = json!({ "questions": questions }).to_string();
    json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
    .to_string()
}

#[tokio::test]
async fn test_proxy_posts_count_and_returns_questions() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/trivia")
        .match_body(Matcher::Json(json!({ "count": 3 })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "questions": sample_batch(0..3) }).to_string())
        .create_async()
        .await;

    let batch = proxy(&server).request(3).await.unwrap().unwrap();
    assert_eq!(batch, sample_batch(0..3));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_proxy_surfaces_error_details() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/trivia")
        .with_status(500)
        .with_body(r#"{"error":"Failed to generate trivia questions","details":"quota exhausted"}"#)
        .create_async()
        .await;

    let err = proxy(&server).request(5).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("quota exhausted"));
}

#[tokio::test]
async fn test_proxy_client_error_keeps_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/trivia")
        .with_status(400)
        .with_body(r#"{"error":"Count must be between 1 and 10"}"#)
        .create_async()
        .await;

    let err = proxy(&server).request(5).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Count must be between 1 and 10"));
}

#[tokio::test]
async fn test_proxy_rejects_malformed_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/trivia")
        .with_status(200)
        .with_body(r#"{"questions":"not a list"}"#)
        .create_async()
        .await;

    let err = proxy(&server).request(5).await.unwrap_err();
    assert!(matches!(err, FetchError::Schema(_)));
}

#[tokio::test]
async fn test_proxy_missing_questions_is_none() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/trivia")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    assert_eq!(proxy(&server).request(5).await.unwrap(), None);
}

#[tokio::test]
async fn test_proxy_unreachable_is_transport_error() {
    let transport = ProxyTransport::new("http://127.0.0.1:1/api/trivia", TIMEOUT).unwrap();
    let err = transport.request(5).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}

#[tokio::test]
async fn test_gemini_parses_generated_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r"^/v1beta/models/.+:generateContent".to_string()))
        .match_query(Matcher::UrlEncoded("key".to_string(), "test-key".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body(json!(sample_batch(0..2))))
        .create_async()
        .await;

    let batch = gemini(&server).request(2).await.unwrap().unwrap();
    assert_eq!(batch, sample_batch(0..2));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_rate_limit_maps_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(r"^/v1beta/models/".to_string()))
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let err = gemini(&server).request(5).await.unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert!(err.to_string().contains("Rate limit exceeded"));
}

#[tokio::test]
async fn test_gemini_without_candidates_is_schema_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(r"^/v1beta/models/".to_string()))
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let err = gemini(&server).request(5).await.unwrap_err();
    assert!(matches!(err, FetchError::Schema(_)));
}

#[tokio::test]
async fn test_fallback_uses_secondary_after_primary_failure() {
    let primary = Arc::new(ScriptedTransport::new().fail_always(FetchError::transport("proxy down")));
    let secondary = Arc::new(ScriptedTransport::new());
    let transport = FallbackTransport::new(primary.clone(), secondary.clone());

    let batch = transport.request(5).await.unwrap().unwrap();
    assert_eq!(batch.len(), 5);
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn test_fallback_skips_secondary_when_primary_answers() {
    let primary = Arc::new(ScriptedTransport::new());
    let secondary = Arc::new(ScriptedTransport::new());
    let transport = FallbackTransport::new(primary.clone(), secondary.clone());

    transport.request(5).await.unwrap();
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn test_fallback_reports_primary_error_when_both_fail() {
    let primary = Arc::new(ScriptedTransport::new().fail_always(FetchError::transport("proxy down")));
    let secondary =
        Arc::new(ScriptedTransport::new().fail_always(FetchError::Schema("bad json".to_string())));
    let transport = FallbackTransport::new(primary, secondary);

    let err = transport.request(5).await.unwrap_err();
    assert_eq!(err, FetchError::transport("proxy down"));
}
