//! Integration tests for the result cache
//!
//! These tests verify:
//! - TTL boundaries on the monotonic clock
//! - Replacement instead of accumulation
//! - Zero TTL never caching
//! - Key normalization across spellings
//! - Concurrent access from many tasks

use sentiscope_core::cache::{CacheConfig, CacheKey, CacheStore};
use sentiscope_core::{AnalysisResult, Label, Sentiment};
use std::sync::Arc;
use std::time::Duration;

fn result(sentiment: Sentiment, score: f64) -> AnalysisResult {
    AnalysisResult::new(sentiment, score)
}

#[tokio::test(start_paused = true)]
async fn test_ttl_boundaries() {
    let cache = CacheStore::new(CacheConfig::default());
    let ttl = Duration::from_secs(60);

    for (i, name) in ["k1", "k2", "k3"].iter().enumerate() {
        let key = CacheKey::from(*name);
        let value = result(Sentiment::Neutral, 0.1 * (i + 1) as f64);
        cache.insert(key.clone(), value.clone(), ttl).await;

        tokio::time::advance(Duration::from_millis(59_999)).await;
        assert_eq!(cache.lookup(&key).await, Some(value), "valid just before expiry");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.lookup(&key).await, None, "absent exactly at expiry");
    }

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.evictions_ttl, 3);
    assert_eq!(stats.entries, 0);
}

#[tokio::test]
async fn test_concrete_scenario_insert_then_lookup() {
    let cache = CacheStore::new(CacheConfig::default());
    let key = CacheKey::from("A");

    cache
        .insert(key.clone(), result(Sentiment::Positive, 0.9), Duration::from_secs(60))
        .await;

    let value = cache.lookup(&key).await.unwrap();
    assert_eq!(value.label, Label::Canonical(Sentiment::Positive));
    assert_eq!(value.score, 0.9);
    // stored values are canonical; the orchestrator adds the provenance flag
    assert!(!value.served_from_cache);
}

#[tokio::test]
async fn test_concrete_scenario_zero_ttl() {
    let cache = CacheStore::new(CacheConfig::default());
    let key = CacheKey::from("C");

    cache.insert(key.clone(), result(Sentiment::Negative, 0.4), Duration::ZERO).await;
    assert_eq!(cache.lookup(&key).await, None);
}

#[tokio::test]
async fn test_replacement_not_accumulation() {
    let cache = CacheStore::new(CacheConfig::default());
    let key = CacheKey::from("https://example.com/story");

    cache
        .insert(key.clone(), result(Sentiment::Positive, 0.9), Duration::from_secs(60))
        .await;
    cache
        .insert(key.clone(), result(Sentiment::Negative, 0.6), Duration::from_secs(60))
        .await;

    assert_eq!(cache.len().await, 1);
    assert_eq!(
        cache.lookup(&key).await,
        Some(result(Sentiment::Negative, 0.6))
    );
}

#[tokio::test(start_paused = true)]
async fn test_replacement_resets_expiry() {
    let cache = CacheStore::new(CacheConfig::default());
    let key = CacheKey::from("k");

    cache.insert(key.clone(), result(Sentiment::Neutral, 0.5), Duration::from_secs(10)).await;
    tokio::time::advance(Duration::from_secs(8)).await;
    cache.insert(key.clone(), result(Sentiment::Neutral, 0.6), Duration::from_secs(10)).await;
    tokio::time::advance(Duration::from_secs(8)).await;

    assert_eq!(cache.lookup(&key).await.map(|v| v.score), Some(0.6));
}

#[tokio::test]
async fn test_normalized_spellings_share_entry() {
    let cache = CacheStore::new(CacheConfig::default());

    cache
        .insert(
            CacheKey::normalize("https://News.Example.com/world/article-1/"),
            result(Sentiment::Neutral, 0.7),
            Duration::from_secs(60),
        )
        .await;

    let hit = cache
        .lookup(&CacheKey::normalize("  https://news.example.com/world/article-1#top "))
        .await;
    assert!(hit.is_some());

    let miss = cache
        .lookup(&CacheKey::normalize("https://news.example.com/world/article-2"))
        .await;
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_invalidate_then_lookup() {
    let cache = CacheStore::new(CacheConfig::default());
    let key = CacheKey::from("k");

    assert!(!cache.invalidate(&key).await);

    cache.insert(key.clone(), result(Sentiment::Positive, 0.8), Duration::from_secs(60)).await;
    assert!(cache.invalidate(&key).await);
    assert_eq!(cache.lookup(&key).await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cache_access() {
    let cache = Arc::new(CacheStore::new(CacheConfig::default()));

    let mut handles = vec![];

    for i in 0..10 {
        let cache_clone = cache.clone();
        let handle = tokio::spawn(async move {
            for j in 0..10 {
                let key = CacheKey::from(format!("key_{}_{}", i, j));
                let value = AnalysisResult::new(Sentiment::Positive, (i * 10 + j) as f64 / 100.0);
                cache_clone.insert(key.clone(), value.clone(), Duration::from_secs(60)).await;
                let retrieved = cache_clone.lookup(&key).await;
                assert_eq!(retrieved, Some(value));
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let stats = cache.stats().await;
    assert_eq!(stats.entries, 100);
    assert_eq!(stats.hits, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_same_key_leave_one_entry() {
    let cache = Arc::new(CacheStore::new(CacheConfig::default()));
    let key = CacheKey::from("contended");

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let value = AnalysisResult::new(Sentiment::Neutral, i as f64 / 32.0);
                cache.insert(key, value, Duration::from_secs(60)).await;
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cache.len().await, 1);
    let stored = cache.lookup(&key).await.unwrap();
    // whichever write landed last is intact
    assert_eq!(stored.label, Label::Canonical(Sentiment::Neutral));
    assert!((0.0..1.0).contains(&stored.score));
}

#[tokio::test(start_paused = true)]
async fn test_background_sweep() {
    let config = CacheConfig::builder()
        .sweep_every(Duration::from_secs(5))
        .build();
    let cache = Arc::new(CacheStore::new(config));

    cache.insert(CacheKey::from("old"), result(Sentiment::Neutral, 0.5), Duration::from_secs(2)).await;
    cache.insert(CacheKey::from("new"), result(Sentiment::Neutral, 0.5), Duration::from_secs(60)).await;

    let sweeper = cache.clone().spawn_sweeper().expect("sweep enabled");
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.stats().await.evictions_ttl, 1);
    sweeper.abort();
}
