//! Response cache
//!
//! Successful completions are cached in memory keyed by a blake3 hash of the
//! request's semantic fields, and persisted as a single JSON file so warm
//! state survives restarts. Entries expire after a configurable TTL.

use crate::types::ChatRequest;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Duration, Utc};
use codeforge_utils::content_hash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One cached completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content: String,
    pub model: String,
    #[serde(default)]
    pub token_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Hit/miss accounting for the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache. Zero when no lookups occurred.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-memory cache with whole-file JSON persistence.
///
/// Not internally synchronized; the client wraps it in its own lock.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
    ttl: Duration,
    path: Option<Utf8PathBuf>,
}

impl ResponseCache {
    /// Creates a cache backed by `path`, loading any persisted entries.
    /// A missing or corrupted file starts the cache empty.
    #[must_use]
    pub fn with_persistence(path: Utf8PathBuf, ttl_secs: u64) -> Self {
        let entries = load_entries(&path);
        Self {
            entries,
            stats: CacheStats::default(),
            ttl: Duration::seconds(ttl_secs as i64),
            path: Some(path),
        }
    }

    /// Creates an in-memory cache with no disk backing.
    #[must_use]
    pub fn in_memory(ttl_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
            ttl: Duration::seconds(ttl_secs as i64),
            path: None,
        }
    }

    /// Cache key for a request: blake3 over the fields that determine the
    /// completion. `max_tokens` and `stream` do not affect the key.
    #[must_use]
    pub fn key_for(request: &ChatRequest) -> String {
        let canonical = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
        });
        content_hash(&canonical.to_string())
    }

    /// Looks up a cached completion, counting a hit or miss. Expired entries
    /// are evicted on access and count as misses.
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        match self.entries.get(key) {
            Some(entry) if !self.is_expired(entry) => {
                self.stats.hits += 1;
                Some(entry.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.evictions += 1;
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Stores a completion and rewrites the persistence file when configured.
    /// Persistence failures are logged and do not fail the caller.
    pub fn put(&mut self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
        self.stats.writes += 1;
        self.persist();
    }

    /// Drops all expired entries, returning how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let now = Utc::now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.created_at < ttl);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.stats.evictions += removed as u64;
            self.persist();
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        Utc::now() - entry.created_at >= self.ttl
    }

    /// Rewrites the whole persistence file. Concurrent writers would race on
    /// the full-file rewrite; a single client instance owns each cache file.
    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => {
                if let Err(e) = codeforge_utils::write_file_atomic(path, &json) {
                    tracing::warn!(path = %path, error = %e, "Failed to persist response cache");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize response cache");
            }
        }
    }
}

fn load_entries(path: &Utf8Path) -> HashMap<String, CacheEntry> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Corrupted response cache, starting empty");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn request(model: &str, prompt: &str, temperature: f64) -> ChatRequest {
        ChatRequest {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            temperature,
            max_tokens: 256,
            stream: false,
        }
    }

    fn entry(content: &str) -> CacheEntry {
        CacheEntry {
            content: content.into(),
            model: "test-model".into(),
            token_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn key_ignores_max_tokens() {
        let mut a = request("m", "p", 0.2);
        let mut b = request("m", "p", 0.2);
        a.max_tokens = 1;
        b.max_tokens = 9999;
        assert_eq!(ResponseCache::key_for(&a), ResponseCache::key_for(&b));
    }

    #[test]
    fn key_varies_with_semantic_fields() {
        let base = request("m", "p", 0.2);
        assert_ne!(
            ResponseCache::key_for(&base),
            ResponseCache::key_for(&request("m2", "p", 0.2))
        );
        assert_ne!(
            ResponseCache::key_for(&base),
            ResponseCache::key_for(&request("m", "p2", 0.2))
        );
        assert_ne!(
            ResponseCache::key_for(&base),
            ResponseCache::key_for(&request("m", "p", 0.9))
        );
    }

    #[test]
    fn get_counts_hits_and_misses() {
        let mut cache = ResponseCache::in_memory(3600);
        assert!(cache.get("absent").is_none());
        cache.put("k".into(), entry("v"));
        assert!(cache.get("k").is_some());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn expired_entries_are_evicted_on_access() {
        let mut cache = ResponseCache::in_memory(3600);
        let stale = CacheEntry {
            content: "old".into(),
            model: "m".into(),
            token_count: 0,
            created_at: Utc::now() - Duration::hours(2),
        };
        cache.put("k".into(), stale);
        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn cleanup_removes_only_expired() {
        let mut cache = ResponseCache::in_memory(3600);
        cache.put("fresh".into(), entry("a"));
        cache.put(
            "stale".into(),
            CacheEntry {
                content: "b".into(),
                model: "m".into(),
                token_count: 0,
                created_at: Utc::now() - Duration::hours(2),
            },
        );
        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn persistence_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("cache.json")).unwrap();

        let mut cache = ResponseCache::with_persistence(path.clone(), 3600);
        cache.put("k".into(), entry("persisted"));
        drop(cache);

        let mut reloaded = ResponseCache::with_persistence(path, 3600);
        let hit = reloaded.get("k").unwrap();
        assert_eq!(hit.content, "persisted");
    }

    #[test]
    fn corrupted_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("cache.json")).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        let cache = ResponseCache::with_persistence(path, 3600);
        assert!(cache.is_empty());
    }
}
