//! Client-level behavior: caching, rate limiting, retry, and model fallback.

mod common;

use codeforge::client::{Message, RequestClient};
use codeforge::config::ClientConfig;
use codeforge::utils::error::ClientError;
use common::{chat_response, StubTransport};
use std::sync::Arc;
use std::time::Duration;

fn test_config() -> ClientConfig {
    ClientConfig {
        model: "primary".to_string(),
        fallback_models: vec!["backup".to_string()],
        max_attempts: 3,
        backoff_base_ms: 1,
        rate_limit: 10,
        rate_window_secs: 60,
        cache_ttl_secs: 3600,
        ..ClientConfig::default()
    }
}

fn prompt(text: &str) -> Vec<Message> {
    vec![Message::user(text)]
}

#[tokio::test]
async fn identical_requests_within_ttl_are_served_from_cache() {
    let transport = Arc::new(StubTransport::always("generated"));
    let client = RequestClient::new_in_memory(transport.clone(), test_config());

    let first = client.send_request(prompt("hello")).await.unwrap();
    let second = client.send_request(prompt("hello")).await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.content, second.content);
    assert_eq!(transport.calls(), 1);
    assert_eq!(client.metrics().cache_hits, 1);
}

#[tokio::test]
async fn cache_hits_do_not_consume_rate_window_slots() {
    let config = ClientConfig {
        rate_limit: 1,
        ..test_config()
    };
    let transport = Arc::new(StubTransport::always("generated"));
    let client = RequestClient::new_in_memory(transport.clone(), config);

    client.send_request(prompt("same")).await.unwrap();
    // Served from cache: must not touch the window
    client.send_request(prompt("same")).await.unwrap();
    // The single slot is already used, so a distinct request fails locally
    let err = client.send_request(prompt("different")).await.unwrap_err();
    assert!(matches!(err, ClientError::RateLimited { used: 1, limit: 1 }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn expired_ttl_bypasses_cache_and_hits_network() {
    let config = ClientConfig {
        cache_ttl_secs: 0,
        ..test_config()
    };
    let transport = Arc::new(StubTransport::always("generated"));
    let client = RequestClient::new_in_memory(transport.clone(), config);

    client.send_request(prompt("hello")).await.unwrap();
    let second = client.send_request(prompt("hello")).await.unwrap();

    assert!(!second.from_cache);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn quota_plus_one_fails_and_window_reset_recovers() {
    let config = ClientConfig {
        rate_limit: 2,
        rate_window_secs: 1,
        ..test_config()
    };
    let transport = Arc::new(StubTransport::always("generated"));
    let client = RequestClient::new_in_memory(transport.clone(), config);

    client.send_request(prompt("one")).await.unwrap();
    client.send_request(prompt("two")).await.unwrap();
    let err = client.send_request(prompt("three")).await.unwrap_err();
    assert!(matches!(err, ClientError::RateLimited { used: 2, limit: 2 }));
    assert_eq!(transport.calls(), 2);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    client.send_request(prompt("three")).await.unwrap();
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn model_unavailable_rotates_to_fallback() {
    let transport = Arc::new(StubTransport::scripted(vec![
        Err(ClientError::ModelUnavailable("primary is gone".to_string())),
        Ok(chat_response("generated", "backup")),
    ]));
    let client = RequestClient::new_in_memory(transport.clone(), test_config());

    let completion = client.send_request(prompt("hello")).await.unwrap();

    assert_eq!(completion.model, "backup");
    assert_eq!(transport.models_seen(), vec!["primary", "backup"]);
    let metrics = client.metrics();
    assert_eq!(metrics.fallback_switches, 1);
    assert_eq!(metrics.retries, 1);
    assert_eq!(metrics.failures, 0);
}

#[tokio::test]
async fn transient_upstream_errors_are_retried() {
    let transport = Arc::new(StubTransport::scripted(vec![
        Err(ClientError::Upstream("HTTP 503".to_string())),
        Err(ClientError::Timeout {
            duration: Duration::from_secs(1),
        }),
        Ok(chat_response("generated", "primary")),
    ]));
    let client = RequestClient::new_in_memory(transport.clone(), test_config());

    let completion = client.send_request(prompt("hello")).await.unwrap();
    assert_eq!(completion.content, "generated");
    assert_eq!(transport.calls(), 3);
    assert_eq!(client.metrics().retries, 2);
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let transport = Arc::new(StubTransport::scripted(vec![Err(ClientError::Auth(
        "HTTP 401".to_string(),
    ))]));
    let client = RequestClient::new_in_memory(transport.clone(), test_config());

    let err = client.send_request(prompt("hello")).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(_)));
    assert_eq!(transport.calls(), 1);
    assert_eq!(client.metrics().failures, 1);
}

#[tokio::test]
async fn exhausted_attempts_propagate_last_error() {
    let transport = Arc::new(StubTransport::scripted(vec![
        Err(ClientError::Upstream("HTTP 500".to_string())),
        Err(ClientError::Upstream("HTTP 502".to_string())),
        Err(ClientError::Upstream("HTTP 503".to_string())),
    ]));
    let client = RequestClient::new_in_memory(transport.clone(), test_config());

    let err = client.send_request(prompt("hello")).await.unwrap_err();
    match err {
        ClientError::Upstream(message) => assert!(message.contains("503")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.calls(), 3);
    assert_eq!(client.metrics().failures, 1);
}

#[tokio::test]
async fn generate_code_strips_markdown_fences() {
    let transport = Arc::new(StubTransport::always(
        "```typescript\nexport const Button = () => null;\n```",
    ));
    let client = RequestClient::new_in_memory(transport, test_config());

    let completion = client
        .generate_code("You generate components.", "make a button")
        .await
        .unwrap();
    assert_eq!(completion.content, "export const Button = () => null;");
}

#[tokio::test]
async fn metrics_reset_clears_counters() {
    let transport = Arc::new(StubTransport::always("generated"));
    let client = RequestClient::new_in_memory(transport, test_config());

    client.send_request(prompt("hello")).await.unwrap();
    assert_eq!(client.metrics().requests, 1);
    client.reset_metrics();
    assert_eq!(client.metrics().requests, 0);
}
