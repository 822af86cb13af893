//! Topic-keyed caches for fetched papers and derived chat context.
//!
//! Both caches are explicit objects with injected capacity and TTL, held in
//! the app state rather than as ambient globals, and are safe to share
//! across request handlers. Paper fetches are single-flight: concurrent
//! callers of the same key await one in-flight upstream call.

use crate::model::FetchOutcome;
use moka::future::Cache;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Stable identifier for a topic. Deterministic, non-cryptographic use of
/// blake3 over the UTF-8 bytes; collisions are a theoretical risk we accept.
pub fn topic_key(topic: &str) -> String {
    blake3::hash(topic.as_bytes()).to_hex().to_string()
}

/// Paper-cache key. Mixes the fetch parameters in so a hit never returns a
/// list fetched under a different `max_results`/`years`.
fn fetch_key(topic: &str, max_results: usize, years: i64) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(topic.as_bytes());
    hasher.update(&(max_results as u64).to_le_bytes());
    hasher.update(&years.to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

#[derive(Clone)]
pub struct PaperCache {
    inner: Cache<String, FetchOutcome>,
}

impl PaperCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Returns the cached outcome for `(topic, max_results, years)` or runs
    /// `fetch_fn` to populate it. A degraded outcome is cached like any
    /// other; the TTL bounds how long an outage-empty list is served.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        topic: &str,
        max_results: usize,
        years: i64,
        fetch_fn: F,
    ) -> FetchOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        let key = fetch_key(topic, max_results, years);
        if let Some(hit) = self.inner.get(&key).await {
            info!(papers = hit.papers.len(), "paper cache hit");
            return hit;
        }
        self.inner.get_with(key, fetch_fn()).await
    }
}

#[derive(Clone)]
pub struct ContextCache {
    inner: Cache<String, String>,
}

impl ContextCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    pub async fn get_or_build<F, Fut>(&self, topic: &str, build_fn: F) -> String
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = String>,
    {
        let key = topic_key(topic);
        if let Some(hit) = self.inner.get(&key).await {
            info!("context cache hit");
            return hit;
        }
        self.inner.get_with(key, build_fn()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaperRecord;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn outcome(n: usize) -> FetchOutcome {
        let papers = (0..n)
            .map(|i| PaperRecord {
                title: format!("Paper {i}"),
                authors: vec!["A. Author".to_string()],
                published: Utc::now(),
                url: format!("http://arxiv.org/pdf/{i}"),
                abstract_text: None,
            })
            .collect();
        FetchOutcome {
            papers,
            degraded: false,
        }
    }

    #[test]
    fn topic_key_is_deterministic() {
        assert_eq!(topic_key("quantum computing"), topic_key("quantum computing"));
        assert_ne!(topic_key("quantum computing"), topic_key("quantum computing "));
    }

    #[test]
    fn fetch_key_separates_parameters() {
        assert_ne!(fetch_key("t", 10, 5), fetch_key("t", 20, 5));
        assert_ne!(fetch_key("t", 10, 5), fetch_key("t", 10, 3));
        assert_eq!(fetch_key("t", 10, 5), fetch_key("t", 10, 5));
    }

    #[tokio::test]
    async fn second_lookup_hits_cache() {
        let cache = PaperCache::new(100, Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let got = cache
                .get_or_fetch("llm agents", 10, 5, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    outcome(3)
                })
                .await;
            assert_eq!(got.papers.len(), 3);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let cache = Arc::new(PaperCache::new(100, Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("same topic", 10, 5, move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        outcome(1)
                    })
                    .await
            }));
        }
        for t in tasks {
            assert_eq!(t.await.unwrap().papers.len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
