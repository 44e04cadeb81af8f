//! Transport seam between the client state machine and the network
//!
//! `RemoteTransport` lets tests drive the retry, fallback, and caching logic
//! without a network. `HttpTransport` is the production implementation.

use crate::types::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use codeforge_config::ClientConfig;
use codeforge_utils::error::ClientError;
use std::time::Duration;

/// Sends one chat request and maps failures to the client error taxonomy.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError>;
}

/// HTTP transport backed by a shared connection pool.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Builds the transport from client configuration, reading the API key
    /// from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns `Misconfiguration` if the key variable is unset or empty, or
    /// if the underlying HTTP client cannot be constructed.
    pub fn new_from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ClientError::Misconfiguration(format!(
                    "API key environment variable {} is not set",
                    config.api_key_env
                ))
            })?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| {
                ClientError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    ClientError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &body, &request.model));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}

/// Maps an HTTP error status to the client error taxonomy.
///
/// 401/403 are auth failures, 404 on a model lookup means the model is gone,
/// 429 is upstream quota, remaining 4xx are transport, and 5xx are retryable
/// upstream errors.
fn map_status_error(status: reqwest::StatusCode, body: &str, model: &str) -> ClientError {
    let detail = summarize_body(body);
    match status.as_u16() {
        401 | 403 => ClientError::Auth(format!("HTTP {status}: {detail}")),
        404 => ClientError::ModelUnavailable(format!("model '{model}' not found: {detail}")),
        429 => ClientError::UpstreamQuota(detail),
        400..=499 => {
            if body.contains("model_not_found") || body.contains("model_unavailable") {
                ClientError::ModelUnavailable(format!("model '{model}': {detail}"))
            } else {
                ClientError::Transport(format!("HTTP {status}: {detail}"))
            }
        }
        _ => ClientError::Upstream(format!("HTTP {status}: {detail}")),
    }
}

/// Truncates an error body for logging; bodies can carry large payloads.
fn summarize_body(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let cut = trimmed
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...", &trimmed[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn maps_auth_statuses() {
        assert!(matches!(
            map_status_error(StatusCode::UNAUTHORIZED, "", "m"),
            ClientError::Auth(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::FORBIDDEN, "", "m"),
            ClientError::Auth(_)
        ));
    }

    #[test]
    fn maps_not_found_to_model_unavailable() {
        let err = map_status_error(StatusCode::NOT_FOUND, "", "gone-model");
        match err {
            ClientError::ModelUnavailable(msg) => assert!(msg.contains("gone-model")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn maps_quota_and_server_errors() {
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, "slow down", "m"),
            ClientError::UpstreamQuota(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::SERVICE_UNAVAILABLE, "", "m"),
            ClientError::Upstream(_)
        ));
    }

    #[test]
    fn model_not_found_body_on_400_maps_to_model_unavailable() {
        let err = map_status_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"model_not_found"}}"#,
            "m",
        );
        assert!(matches!(err, ClientError::ModelUnavailable(_)));
    }

    #[test]
    fn summarize_truncates_long_bodies() {
        let long = "x".repeat(500);
        let summary = summarize_body(&long);
        assert!(summary.len() <= 203);
        assert!(summary.ends_with("..."));
    }
}
