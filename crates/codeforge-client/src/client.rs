//! Request client state machine
//!
//! Order of checks for each logical request: response cache, local rate
//! window, then the network attempt loop with exponential backoff and model
//! fallback rotation.

use crate::cache::{CacheEntry, CacheStats, ResponseCache};
use crate::transport::RemoteTransport;
use crate::types::{ChatRequest, ChatResponse, Message};
use chrono::Utc;
use codeforge_config::ClientConfig;
use codeforge_utils::error::ClientError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Counters for client activity since construction or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientMetrics {
    /// Logical requests, including those served from cache
    pub requests: u64,
    /// Requests served without a network call
    pub cache_hits: u64,
    /// Network attempts beyond the first, across all requests
    pub retries: u64,
    /// Times the client rotated to a fallback model
    pub fallback_switches: u64,
    /// Requests that ultimately failed
    pub failures: u64,
    /// Tokens consumed by successful network calls, as reported upstream
    pub total_tokens: u64,
    /// Sum of wall-clock time spent in successful network calls
    pub total_latency_ms: u64,
}

impl ClientMetrics {
    /// Mean latency of successful network calls, in milliseconds.
    #[must_use]
    pub fn avg_latency_ms(&self) -> f64 {
        let network_successes = self.requests - self.cache_hits - self.failures;
        if network_successes == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / network_successes as f64
        }
    }
}

/// Sliding rate window: at most `limit` network requests per `window`.
#[derive(Debug)]
struct RateWindow {
    limit: u32,
    window: Duration,
    started_at: Instant,
    used: u32,
}

impl RateWindow {
    fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            started_at: Instant::now(),
            used: 0,
        }
    }

    /// Reserves one slot in the current window.
    fn try_acquire(&mut self) -> Result<(), ClientError> {
        if self.started_at.elapsed() >= self.window {
            self.started_at = Instant::now();
            self.used = 0;
        }
        if self.used >= self.limit {
            return Err(ClientError::RateLimited {
                used: self.used,
                limit: self.limit,
            });
        }
        self.used += 1;
        Ok(())
    }
}

/// Completion result handed back to callers.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    /// Model that produced the content; may be a fallback
    pub model: String,
    /// Total tokens reported upstream; zero for cache hits recorded before
    /// token accounting and for endpoints that omit usage
    pub tokens: u32,
    pub from_cache: bool,
}

/// Chat-completion client with caching, rate limiting, retry, and model
/// fallback. All state is instance-owned; construct one per pipeline and
/// share it behind the `Arc` it hands out from [`RequestClient::new`].
pub struct RequestClient {
    transport: Arc<dyn RemoteTransport>,
    config: ClientConfig,
    cache: Mutex<ResponseCache>,
    rate: Mutex<RateWindow>,
    metrics: Mutex<ClientMetrics>,
}

impl RequestClient {
    /// Creates a client over the given transport, with a disk-backed cache
    /// rooted at the configured path under `workspace_root`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        config: ClientConfig,
        workspace_root: &camino::Utf8Path,
    ) -> Self {
        let cache_path = workspace_root.join(&config.cache_path);
        let cache = ResponseCache::with_persistence(cache_path, config.cache_ttl_secs);
        Self::with_cache(transport, config, cache)
    }

    /// Creates a client with an in-memory cache. Used by tests and callers
    /// that do not want warm state on disk.
    #[must_use]
    pub fn new_in_memory(transport: Arc<dyn RemoteTransport>, config: ClientConfig) -> Self {
        let cache = ResponseCache::in_memory(config.cache_ttl_secs);
        Self::with_cache(transport, config, cache)
    }

    fn with_cache(
        transport: Arc<dyn RemoteTransport>,
        config: ClientConfig,
        cache: ResponseCache,
    ) -> Self {
        let rate = RateWindow::new(
            config.rate_limit,
            Duration::from_secs(config.rate_window_secs),
        );
        Self {
            transport,
            config,
            cache: Mutex::new(cache),
            rate: Mutex::new(rate),
            metrics: Mutex::new(ClientMetrics::default()),
        }
    }

    /// Sends a chat request through the full state machine.
    ///
    /// Cache hits return immediately and do not consume rate-window slots.
    /// Retryable failures back off exponentially; `ModelUnavailable` rotates
    /// to the next fallback model before the next attempt.
    ///
    /// # Errors
    ///
    /// Returns `RateLimited` without any network attempt when the local
    /// window is exhausted, or the last attempt's error once no retries
    /// remain.
    pub async fn send_request(&self, messages: Vec<Message>) -> Result<Completion, ClientError> {
        self.lock_metrics().requests += 1;

        let mut request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let key = ResponseCache::key_for(&request);
        if let Some(entry) = self.lock_cache().get(&key) {
            tracing::debug!(key = %key, model = %entry.model, "Cache hit");
            self.lock_metrics().cache_hits += 1;
            return Ok(Completion {
                content: entry.content,
                model: entry.model,
                tokens: entry.token_count,
                from_cache: true,
            });
        }

        if let Err(e) = self.lock_rate().try_acquire() {
            self.lock_metrics().failures += 1;
            return Err(e);
        }

        let mut fallbacks = self.config.fallback_models.iter();
        let mut last_error: Option<ClientError> = None;

        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 {
                self.lock_metrics().retries += 1;
                let backoff = Duration::from_millis(
                    self.config.backoff_base_ms << (attempt - 2).min(16),
                );
                tracing::debug!(attempt, backoff_ms = backoff.as_millis() as u64, "Retrying");
                tokio::time::sleep(backoff).await;
            }

            let started = Instant::now();
            match self.transport.send(&request).await {
                Ok(response) => {
                    let latency = started.elapsed().as_millis() as u64;
                    let content = extract_content(&response)?;
                    let model = if response.model.is_empty() {
                        request.model.clone()
                    } else {
                        response.model.clone()
                    };
                    let tokens = response.usage.total_tokens;
                    self.lock_cache().put(
                        key,
                        CacheEntry {
                            content: content.clone(),
                            model: model.clone(),
                            token_count: tokens,
                            created_at: Utc::now(),
                        },
                    );
                    {
                        let mut metrics = self.lock_metrics();
                        metrics.total_tokens += u64::from(tokens);
                        metrics.total_latency_ms += latency;
                    }
                    tracing::debug!(model = %model, latency_ms = latency, tokens, "Request complete");
                    return Ok(Completion {
                        content,
                        model,
                        tokens,
                        from_cache: false,
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    if matches!(e, ClientError::ModelUnavailable(_)) {
                        if let Some(next) = fallbacks.next() {
                            tracing::warn!(
                                from = %request.model,
                                to = %next,
                                "Model unavailable, switching to fallback"
                            );
                            request.model.clone_from(next);
                            self.lock_metrics().fallback_switches += 1;
                        }
                    }
                    tracing::warn!(attempt, error = %e, "Attempt failed, will retry");
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Request failed");
                    self.lock_metrics().failures += 1;
                    return Err(e);
                }
            }
        }

        // Reached only when max_attempts is zero; the final attempt's error
        // returns from inside the loop.
        self.lock_metrics().failures += 1;
        Err(last_error.unwrap_or_else(|| {
            ClientError::Misconfiguration("max_attempts must be at least 1".to_string())
        }))
    }

    /// Convenience wrapper for code generation: wraps the prompts into
    /// messages, sends the request, and strips any markdown code fence from
    /// the completion.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`RequestClient::send_request`].
    pub async fn generate_code(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Completion, ClientError> {
        let messages = vec![Message::system(system_prompt), Message::user(user_prompt)];
        let mut completion = self.send_request(messages).await?;
        completion.content = strip_code_fences(&completion.content);
        Ok(completion)
    }

    /// Snapshot of the activity counters.
    #[must_use]
    pub fn metrics(&self) -> ClientMetrics {
        *self.lock_metrics()
    }

    pub fn reset_metrics(&self) {
        *self.lock_metrics() = ClientMetrics::default();
    }

    /// Cache hit/miss accounting.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    /// Drops expired cache entries, returning how many were removed.
    pub fn cleanup_cache(&self) -> usize {
        self.lock_cache().cleanup()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_rate(&self) -> std::sync::MutexGuard<'_, RateWindow> {
        self.rate.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_metrics(&self) -> std::sync::MutexGuard<'_, ClientMetrics> {
        self.metrics.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn extract_content(response: &ChatResponse) -> Result<String, ClientError> {
    response
        .first_content()
        .map(str::to_string)
        .ok_or_else(|| ClientError::MalformedResponse("response has no choices".to_string()))
}

/// Strips a single surrounding markdown code fence, with or without a
/// language tag. Content without a fence passes through unchanged.
#[must_use]
pub fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed.to_string();
    };
    // Drop the language tag line, if present
    let body = match body.split_once('\n') {
        Some((first, remainder)) if !first.trim().contains(char::is_whitespace) => remainder,
        _ => body,
    };
    body.trim_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_window_resets_after_interval() {
        let mut window = RateWindow::new(2, Duration::from_millis(10));
        assert!(window.try_acquire().is_ok());
        assert!(window.try_acquire().is_ok());
        assert!(matches!(
            window.try_acquire(),
            Err(ClientError::RateLimited { used: 2, limit: 2 })
        ));
        std::thread::sleep(Duration::from_millis(15));
        assert!(window.try_acquire().is_ok());
    }

    #[test]
    fn strips_fence_with_language_tag() {
        let fenced = "```typescript\nconst x = 1;\n```";
        assert_eq!(strip_code_fences(fenced), "const x = 1;");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\nlet y;\n```"), "let y;");
    }

    #[test]
    fn unfenced_content_passes_through() {
        assert_eq!(strip_code_fences("  plain code  "), "plain code");
    }

    #[test]
    fn avg_latency_ignores_cache_hits_and_failures() {
        let metrics = ClientMetrics {
            requests: 4,
            cache_hits: 1,
            failures: 1,
            total_latency_ms: 300,
            ..ClientMetrics::default()
        };
        assert!((metrics.avg_latency_ms() - 150.0).abs() < f64::EPSILON);
    }
}
